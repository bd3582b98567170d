use crate::{SchemaDef, SchemaError, SchemaSource};
use std::{fs, path::Path};

///
/// JsonSource
///
/// `{ "name": .., "attributes": [..], "dependencies": [{ "lhs": [..], "rhs": [..] }] }`
///

#[derive(Clone, Debug)]
pub struct JsonSource {
    text: String,
}

impl JsonSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| SchemaError::io(path, err))?;

        Ok(Self::new(text))
    }
}

impl SchemaSource for JsonSource {
    fn read_schema(&self) -> Result<SchemaDef, SchemaError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}
