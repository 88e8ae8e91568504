use crate::http_client;
use frankenstein::AnswerCallbackQueryParams;
use frankenstein::CopyMessageParams;
use frankenstein::EditMessageCaptionParams;
use frankenstein::EditMessageReplyMarkupParams;
use frankenstein::EditMessageTextParams;
use frankenstein::ErrorResponse;
use frankenstein::ForwardMessageParams;
use frankenstein::GetChatParams;
use frankenstein::GetUpdatesParams;
use frankenstein::Message;
use frankenstein::MessageId;
use frankenstein::MethodResponse;
use frankenstein::PinChatMessageParams;
use frankenstein::SendAnimationParams;
use frankenstein::SendAudioParams;
use frankenstein::SendDocumentParams;
use frankenstein::SendMessageParams;
use frankenstein::SendPhotoParams;
use frankenstein::SendStickerParams;
use frankenstein::SendVideoNoteParams;
use frankenstein::SendVideoParams;
use frankenstein::SendVoiceParams;
use frankenstein::Update;
use frankenstein::User;
use isahc::AsyncReadResponseExt;
use isahc::HttpClient;
use isahc::Request;
use serde_json::Value;

/// Thin async client speaking the Telegram Bot API wire protocol. Both the
/// bot gateway and the session-scoped userbot gateway construct one of these,
/// differing only in base URL and credential.
#[derive(Clone, Debug)]
pub struct Api {
    pub api_url: String,
    pub http_client: HttpClient,
}

#[derive(Debug)]
pub enum Error {
    HttpError(HttpError),
    ApiError(ErrorResponse),
}

#[derive(Eq, PartialEq, Debug)]
pub struct HttpError {
    pub code: u16,
    pub message: String,
}

impl Api {
    pub fn new(base_url: &str, credential: &str) -> Api {
        let api_url = format!("{base_url}{credential}");
        let http_client = http_client::client().clone();

        Api {
            api_url,
            http_client,
        }
    }

    pub async fn get_updates(
        &self,
        params: &GetUpdatesParams,
    ) -> Result<MethodResponse<Vec<Update>>, Error> {
        self.request("getUpdates", Some(params)).await
    }

    pub async fn get_me(&self) -> Result<MethodResponse<User>, Error> {
        self.request::<(), _>("getMe", None).await
    }

    pub async fn get_chat(&self, params: &GetChatParams) -> Result<Value, Error> {
        self.request("getChat", Some(params)).await
    }

    pub async fn send_message(
        &self,
        params: &SendMessageParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendMessage", Some(params)).await
    }

    pub async fn forward_message(
        &self,
        params: &ForwardMessageParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("forwardMessage", Some(params)).await
    }

    pub async fn copy_message(
        &self,
        params: &CopyMessageParams,
    ) -> Result<MethodResponse<MessageId>, Error> {
        self.request("copyMessage", Some(params)).await
    }

    pub async fn send_photo(
        &self,
        params: &SendPhotoParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendPhoto", Some(params)).await
    }

    pub async fn send_video(
        &self,
        params: &SendVideoParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendVideo", Some(params)).await
    }

    pub async fn send_document(
        &self,
        params: &SendDocumentParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendDocument", Some(params)).await
    }

    pub async fn send_audio(
        &self,
        params: &SendAudioParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendAudio", Some(params)).await
    }

    pub async fn send_voice(
        &self,
        params: &SendVoiceParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendVoice", Some(params)).await
    }

    pub async fn send_video_note(
        &self,
        params: &SendVideoNoteParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendVideoNote", Some(params)).await
    }

    pub async fn send_sticker(
        &self,
        params: &SendStickerParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendSticker", Some(params)).await
    }

    pub async fn send_animation(
        &self,
        params: &SendAnimationParams,
    ) -> Result<MethodResponse<Message>, Error> {
        self.request("sendAnimation", Some(params)).await
    }

    pub async fn edit_message_text(&self, params: &EditMessageTextParams) -> Result<Value, Error> {
        self.request("editMessageText", Some(params)).await
    }

    pub async fn edit_message_caption(
        &self,
        params: &EditMessageCaptionParams,
    ) -> Result<Value, Error> {
        self.request("editMessageCaption", Some(params)).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        params: &EditMessageReplyMarkupParams,
    ) -> Result<Value, Error> {
        self.request("editMessageReplyMarkup", Some(params)).await
    }

    pub async fn pin_chat_message(
        &self,
        params: &PinChatMessageParams,
    ) -> Result<MethodResponse<bool>, Error> {
        self.request("pinChatMessage", Some(params)).await
    }

    pub async fn answer_callback_query(
        &self,
        params: &AnswerCallbackQueryParams,
    ) -> Result<MethodResponse<bool>, Error> {
        self.request("answerCallbackQuery", Some(params)).await
    }

    async fn request<T1: serde::ser::Serialize, T2: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<T1>,
    ) -> Result<T2, Error> {
        let url = format!("{}/{method}", self.api_url);

        let request_builder = Request::post(url).header("Content-Type", "application/json");

        let mut response = match params {
            None => {
                let request = request_builder.body(())?;
                self.http_client.send_async(request).await?
            }
            Some(data) => {
                let json = serde_json::to_string(&data).unwrap();
                let request = request_builder.body(json)?;

                self.http_client.send_async(request).await?
            }
        };

        let body = response.text().await?;

        let parsed_result: Result<T2, serde_json::Error> = serde_json::from_str(&body);

        match parsed_result {
            Ok(result) => Ok(result),
            Err(serde_error) => {
                let parsed_error: Result<ErrorResponse, serde_json::Error> =
                    serde_json::from_str(&body);

                match parsed_error {
                    Ok(result) => Err(Error::ApiError(result)),
                    Err(error) => {
                        log::error!("Failed to parse a response {serde_error:?}");

                        let message = format!("{body} {error:?}");

                        let error = HttpError { code: 500, message };

                        Err(Error::HttpError(error))
                    }
                }
            }
        }
    }
}

impl From<isahc::http::Error> for Error {
    fn from(error: isahc::http::Error) -> Self {
        let message = format!("{error:?}");

        let error = HttpError { code: 500, message };

        Error::HttpError(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        let message = format!("{error:?}");

        let error = HttpError { code: 500, message };

        Error::HttpError(error)
    }
}

impl From<isahc::Error> for Error {
    fn from(error: isahc::Error) -> Self {
        let message = format!("{error:?}");

        let error = HttpError { code: 500, message };

        Error::HttpError(error)
    }
}
