use crate::config::Config;
use crate::filter::language;
use crate::http_client;
use crate::settings::CompiledSettings;
use isahc::AsyncReadResponseExt;
use isahc::Request;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug)]
pub enum TranslateError {
    Http(String),
    BadResponse(String),
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Auto-translation stage. Skips when the detected source language already
/// matches the target; any service error leaves the text untouched.
pub async fn apply(text: &str, settings: &CompiledSettings) -> String {
    let Some(target) = settings.target_language.as_deref() else {
        return text.to_string();
    };

    if language::detect_language(text) == target {
        return text.to_string();
    }

    match translate(text, target).await {
        Ok(translated) => translated,
        Err(error) => {
            log::error!("Translation failed, keeping the original text: {error:?}");
            text.to_string()
        }
    }
}

async fn translate(text: &str, target: &str) -> Result<String, TranslateError> {
    let Some(url) = Config::translate_api_url() else {
        return Err(TranslateError::Http(
            "TRANSLATE_API_URL is not configured".to_string(),
        ));
    };

    let body = json!({
        "q": text,
        "source": "auto",
        "target": target,
        "format": "text",
    });

    let request = Request::post(url)
        .header("Content-Type", "application/json")
        .body(body.to_string())
        .map_err(|error| TranslateError::Http(format!("{error:?}")))?;

    let mut response = http_client::client()
        .send_async(request)
        .await
        .map_err(|error| TranslateError::Http(format!("{error:?}")))?;

    let body = response
        .text()
        .await
        .map_err(|error| TranslateError::Http(format!("{error:?}")))?;

    let parsed: TranslateResponse = serde_json::from_str(&body)
        .map_err(|_| TranslateError::BadResponse(body.clone()))?;

    Ok(parsed.translated_text)
}
