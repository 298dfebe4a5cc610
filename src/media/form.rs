use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::TryStreamExt;

use crate::error::AppError;
use crate::media::UploadedFile;

/// Largest accepted file part.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Largest accepted text part.
pub const MAX_TEXT_BYTES: usize = 64 * 1024;
/// Most text parts accepted in one form.
pub const MAX_TEXT_PARTS: usize = 16;

/// A buffered multipart form: text parts by name and file parts by name.
/// A part counts as a file when its content disposition carries a filename.
#[derive(Debug, Default)]
pub struct MultipartForm {
    text: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    /// Drains the payload into memory. Stops with a 400 as soon as a part is
    /// over its size limit, more than `max_files` file parts arrive, or more
    /// than `MAX_TEXT_PARTS` text parts arrive.
    pub async fn read(mut payload: Multipart, max_files: usize) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        let mut file_parts = 0;
        let mut text_parts = 0;

        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().to_string();
            let filename = field
                .content_disposition()
                .get_filename()
                .map(str::to_string);
            let content_type = field.content_type().map(|mime| mime.to_string());

            let limit = if filename.is_some() {
                file_parts += 1;
                if file_parts > max_files {
                    return Err(AppError::BadRequest(format!(
                        "too many files, the limit is {} per request",
                        max_files
                    )));
                }
                MAX_FILE_BYTES
            } else {
                text_parts += 1;
                if text_parts > MAX_TEXT_PARTS {
                    return Err(AppError::BadRequest(format!(
                        "too many fields, the limit is {} per request",
                        MAX_TEXT_PARTS
                    )));
                }
                MAX_TEXT_BYTES
            };

            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if bytes.len() + chunk.len() > limit {
                    return Err(AppError::BadRequest(format!(
                        "{} is too large, the limit is {} bytes",
                        name, limit
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => form.push_file(
                    &name,
                    UploadedFile::new(Some(filename), content_type, bytes),
                ),
                None => {
                    let value = String::from_utf8(bytes).map_err(|_| {
                        AppError::BadRequest(format!("{} must be valid UTF-8 text", name))
                    })?;
                    form.push_text(&name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn push_text(&mut self, name: &str, value: String) {
        self.text.insert(name.to_string(), value);
    }

    pub fn push_file(&mut self, name: &str, file: UploadedFile) {
        self.files.entry(name.to_string()).or_default().push(file);
    }

    /// The trimmed text value of `name`, or an empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.text
            .get(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    /// Removes and returns every file sent under `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    /// Removes and returns the first file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.take_files(name).into_iter().next()
    }
}
