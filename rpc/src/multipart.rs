//! Collecting a multipart body into text fields and files.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use sigver_verification::Upload;

use crate::error::ApiError;

/// A fully read multipart form. Later parts with a repeated name win.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(rejected)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(rejected)?;
                    form.files.insert(name, Upload::new(filename, bytes.to_vec()));
                }
                None => {
                    let text = field.text().await.map_err(rejected)?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    /// The single file in the form, whatever its field name.
    pub fn take_only_file(&mut self) -> Option<Upload> {
        if self.files.len() != 1 {
            return None;
        }
        let name = self.files.keys().next()?.clone();
        self.files.remove(&name)
    }
}

fn rejected(e: MultipartError) -> ApiError {
    ApiError::request(e.status(), e.body_text())
}
