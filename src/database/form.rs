use std::{collections::HashMap, str::FromStr};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    error::TypeError,
    pagination::PageRequest,
    schema::{RecipeFields, RecipeFilter, RecipePayload},
};

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, TypeError>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key) {
            Some(value) => serde_json::from_value(value.to_owned())
                .map_err(|_e| TypeError::new(&format!("Invalid type for {key}"))),
            None => Err(TypeError::new(&format!("Missing key {key}"))),
        }
    }

    /// Accepts both JSON numbers and numeric strings, since query parameters arrive as strings.
    pub fn get_number<T>(&self, key: &str) -> Result<T, TypeError>
    where
        T: FromStr,
    {
        match self.get_optional_number(key)? {
            Some(v) => Ok(v),
            None => Err(TypeError::new(&format!("Missing key {key}"))),
        }
    }

    pub fn get_optional_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        let raw = match self.inner.get(key) {
            Some(Value::String(v)) => v.trim().to_owned(),
            Some(Value::Number(v)) => v.to_string(),
            Some(Value::Null) | None => return Ok(None),
            Some(_) => return Err(TypeError::new(&format!("Invalid type for {key}"))),
        };

        raw.parse()
            .map(Some)
            .map_err(|_e| TypeError::new(&format!("Failed to parse {key} as a number")))
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new(&format!("Failed to parse {key} as str"))),
            },
            None => Err(TypeError::new(&format!("Missing key {key}"))),
        }
    }

    /// Missing keys are `false`. Accepts booleans and `0`/`1`/`true`/`false` strings.
    pub fn get_flag(&self, key: &str) -> Result<bool, TypeError> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(v)) => Ok(*v),
            Some(Value::Number(v)) => Ok(v.as_i64() == Some(1)),
            Some(Value::String(v)) => match v.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                _ => Err(TypeError::new(&format!("Invalid flag {key}"))),
            },
            Some(_) => Err(TypeError::new(&format!("Invalid flag {key}"))),
        }
    }

    /// Missing keys are an empty list; a single scalar is a list of one.
    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, TypeError>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(_)) => self.get_value(key),
            Some(value) => serde_json::from_value(value.to_owned())
                .map(|v| vec![v])
                .map_err(|_e| TypeError::new(&format!("Invalid type for {key}"))),
        }
    }
}

impl TryFrom<Form> for RecipePayload {
    type Error = TypeError;

    fn try_from(form: Form) -> Result<Self, Self::Error> {
        Ok(Self {
            fields: RecipeFields {
                name: form.get_str("name")?,
                image: form.get_str("image")?,
                text: form.get_str("text")?,
                cooking_time: form.get_number("cooking_time")?,
            },
            tags: form.get_list("tags")?,
            ingredients: form.get_list("ingredients")?,
        })
    }
}

impl TryFrom<&Form> for RecipeFilter {
    type Error = TypeError;

    fn try_from(form: &Form) -> Result<Self, Self::Error> {
        Ok(Self {
            author: form.get_optional_number("author")?,
            tags: form.get_list("tags")?,
            is_favorited: form.get_flag("is_favorited")?,
            is_in_shopping_cart: form.get_flag("is_in_shopping_cart")?,
        })
    }
}

impl TryFrom<&Form> for PageRequest {
    type Error = TypeError;

    fn try_from(form: &Form) -> Result<Self, Self::Error> {
        Ok(PageRequest::new(
            form.get_optional_number("page")?,
            form.get_optional_number("limit")?,
        ))
    }
}
