use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::utils::error::CustomError;

/// A file pulled out of a multipart request body
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Fields accepted by the post create/update endpoints.
///
/// `attachments` distinguishes "field never sent" (`None`) from "field sent
/// with no files" (`Some(vec![])`) so the workflow can reject the former
/// before any writes happen.
#[derive(Default)]
pub struct PostForm {
    pub body: Option<String>,
    pub group_id: Option<String>,
    pub deleted_file_ids: Vec<String>,
    pub attachments: Option<Vec<UploadedFile>>,
}

/// Drain a multipart payload into a PostForm
pub async fn parse_post_form(mut payload: Multipart) -> Result<PostForm, CustomError> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        let content_disposition = match field.content_disposition() {
            Some(cd) => cd,
            None => continue,
        };

        let field_name = content_disposition.get_name().unwrap_or("").to_string();
        let file_name = content_disposition.get_filename().map(|f| f.to_string());
        let content_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                CustomError::BadRequestError(format!("Error reading field chunk: {}", e))
            })?;
            data.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "attachments" | "attachments[]" => {
                let files = form.attachments.get_or_insert_with(Vec::new);
                if !data.is_empty() {
                    files.push(UploadedFile {
                        name: file_name.unwrap_or_else(|| "unknown".to_string()),
                        mime: content_type
                            .unwrap_or_else(|| "application/octet-stream".to_string()),
                        data,
                    });
                }
            }
            "body" => form.body = Some(text_field(data)?),
            "group_id" => {
                let value = text_field(data)?;
                if !value.is_empty() {
                    form.group_id = Some(value);
                }
            }
            "deleted_file_ids" | "deleted_file_ids[]" => {
                form.deleted_file_ids.push(text_field(data)?);
            }
            _ => continue,
        }
    }

    Ok(form)
}

fn text_field(data: Vec<u8>) -> Result<String, CustomError> {
    String::from_utf8(data)
        .map(|s| s.trim().to_string())
        .map_err(|_| CustomError::BadRequestError("Field is not valid UTF-8".to_string()))
}
