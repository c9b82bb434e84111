use axum::extract::Multipart;

/// An uploaded statement PDF.
pub struct UploadedPdf {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Read the `pdf` field of a multipart upload. Other fields are ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedPdf, String> {
    let mut file: Option<UploadedPdf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "pdf" {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read file data: {}", e))?
                .to_vec();

            check_pdf(&filename, &data)?;
            file = Some(UploadedPdf { filename, data });
        } else {
            let _ = field.bytes().await;
        }
    }

    file.ok_or_else(|| "No file uploaded (expected a \"pdf\" field)".to_string())
}

/// Only PDF content is accepted, whatever the file is called.
pub fn check_pdf(filename: &str, data: &[u8]) -> Result<(), String> {
    if data.is_empty() {
        return Err(format!("{} is empty", filename));
    }
    if !data.starts_with(b"%PDF-") {
        return Err(format!("{} doesn't appear to be a valid PDF", filename));
    }
    Ok(())
}
