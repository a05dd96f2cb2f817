//! Parsing of the multipart create/update form into text fields and files.

use axum::extract::Multipart;

use crate::database::models::Role;
use crate::error::ApiError;
use crate::services::UserInput;
use crate::storage::intake::{IncomingFile, IntakeError, UploadBundle};
use crate::storage::slots::Slot;

/// Walks the multipart body once, splitting it into profile fields and
/// per-slot attachments. File parts must use one of the five slot field
/// names; unknown text fields are ignored like the rest of the API ignores
/// extra JSON keys.
pub async fn parse_user_request(
    multipart: &mut Multipart,
) -> Result<(UserInput, UploadBundle), ApiError> {
    let mut input = UserInput::default();
    let mut uploads = UploadBundle::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let Some(slot) = Slot::from_field_name(&field_name) else {
                return Err(IntakeError::UnknownField(field_name).into());
            };
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await?;

            // Browsers submit an empty part for untouched file inputs.
            if original_name.is_empty() && bytes.is_empty() {
                continue;
            }

            uploads.push(slot, IncomingFile { original_name, content_type, bytes });
            continue;
        }

        let value = field.text().await?;
        match field_name.as_str() {
            "name" => input.name = Some(value),
            "email" => input.email = Some(value),
            "password" => {
                // An empty password field on the edit form means "keep".
                if !value.is_empty() {
                    input.password = Some(value);
                }
            }
            "phone" => input.phone = Some(value),
            "address" => input.address = Some(value),
            "role" => {
                let role = Role::parse(&value).ok_or_else(|| {
                    ApiError::validation_error(format!("Unknown role '{value}'"))
                })?;
                input.role = Some(role);
            }
            _ => {}
        }
    }

    Ok((input, uploads))
}
