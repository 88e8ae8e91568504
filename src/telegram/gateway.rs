use crate::config::Config;
use crate::telegram::client::{Api, Error};
use crate::telegram::incoming::MediaKind;
use async_trait::async_trait;
use frankenstein::CopyMessageParams;
use frankenstein::EditMessageCaptionParams;
use frankenstein::EditMessageReplyMarkupParams;
use frankenstein::EditMessageTextParams;
use frankenstein::FileUpload;
use frankenstein::ForwardMessageParams;
use frankenstein::GetChatParams;
use frankenstein::InlineKeyboardMarkup;
use frankenstein::LinkPreviewOptions;
use frankenstein::ParseMode;
use frankenstein::PinChatMessageParams;
use frankenstein::ReplyMarkup;
use frankenstein::ReplyParameters;
use frankenstein::SendAnimationParams;
use frankenstein::SendAudioParams;
use frankenstein::SendDocumentParams;
use frankenstein::SendMessageParams;
use frankenstein::SendPhotoParams;
use frankenstein::SendStickerParams;
use frankenstein::SendVideoNoteParams;
use frankenstein::SendVideoParams;
use frankenstein::SendVoiceParams;
use std::sync::atomic::{AtomicBool, Ordering};
use typed_builder::TypedBuilder;

/// Target-chat errors that mean the backend lacks posting rights; these are
/// logged and surfaced but never retried.
const PERMISSION_ERRORS: [&str; 8] = [
    "Bad Request: CHAT_WRITE_FORBIDDEN",
    "Bad Request: chat not found",
    "Bad Request: have no rights to send a message",
    "Bad Request: need administrator rights in the channel chat",
    "Forbidden: bot is not a member of the channel chat",
    "Forbidden: bot was kicked from the channel chat",
    "Forbidden: bot was blocked by the user",
    "Forbidden: the group chat was deleted",
];

#[derive(Debug)]
pub enum GatewayError {
    Api { code: Option<i64>, description: String },
    Http { message: String },
    Unsupported { what: String },
}

impl GatewayError {
    pub fn is_permission(&self) -> bool {
        match self {
            GatewayError::Api { description, .. } => PERMISSION_ERRORS
                .iter()
                .any(|known| description.contains(known)),
            _ => false,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http { .. } => true,
            GatewayError::Api { code, .. } => {
                matches!(code, Some(429) | Some(500..=599))
            }
            GatewayError::Unsupported { .. } => false,
        }
    }

    pub fn description(&self) -> String {
        match self {
            GatewayError::Api { description, .. } => description.clone(),
            GatewayError::Http { message } => message.clone(),
            GatewayError::Unsupported { what } => format!("unsupported operation: {what}"),
        }
    }
}

impl From<Error> for GatewayError {
    fn from(error: Error) -> Self {
        match error {
            Error::ApiError(response) => GatewayError::Api {
                code: Some(response.error_code as i64),
                description: response.description,
            },
            Error::HttpError(http_error) => GatewayError::Http {
                message: http_error.message,
            },
        }
    }
}

#[derive(TypedBuilder, Debug)]
pub struct SendTextSpec {
    pub chat_id: i64,
    pub text: String,
    #[builder(default, setter(into))]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[builder(default, setter(into))]
    pub reply_to_message_id: Option<i32>,
    #[builder(default = false)]
    pub silent: bool,
    #[builder(default = false)]
    pub link_preview: bool,
}

#[derive(TypedBuilder, Debug)]
pub struct SendMediaSpec {
    pub chat_id: i64,
    pub kind: MediaKind,
    pub file_id: String,
    #[builder(default, setter(into))]
    pub caption: Option<String>,
    #[builder(default, setter(into))]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[builder(default, setter(into))]
    pub reply_to_message_id: Option<i32>,
    #[builder(default = false)]
    pub silent: bool,
}

#[derive(TypedBuilder, Debug)]
pub struct CopySpec {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i32,
    /// `Some("")` drops the caption entirely, `Some(text)` replaces it, `None`
    /// keeps the original.
    #[builder(default, setter(into))]
    pub caption: Option<String>,
    /// The wire protocol drops the original keyboard on copy, so a keyboard
    /// to keep must be passed back explicitly.
    #[builder(default, setter(into))]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[builder(default, setter(into))]
    pub reply_to_message_id: Option<i32>,
    #[builder(default = false)]
    pub silent: bool,
}

#[derive(TypedBuilder, Debug)]
pub struct ForwardSpec {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i32,
    #[builder(default = false)]
    pub silent: bool,
}

#[derive(TypedBuilder, Debug)]
pub struct EditSpec {
    pub chat_id: i64,
    pub message_id: i32,
    #[builder(default, setter(into))]
    pub text: Option<String>,
    #[builder(default, setter(into))]
    pub caption: Option<String>,
    #[builder(default, setter(into))]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[builder(default = false)]
    pub link_preview: bool,
}

/// The delivery surface consumed by the dispatcher and the edit synchronizer.
/// Implemented by the bot backend and the session-scoped userbot backend.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn is_connected(&self) -> bool;

    /// Chat metadata fetch used by source connectivity tests.
    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>, GatewayError>;

    async fn send_text(&self, spec: &SendTextSpec) -> Result<i32, GatewayError>;

    async fn send_media(&self, spec: &SendMediaSpec) -> Result<i32, GatewayError>;

    async fn copy_message(&self, spec: &CopySpec) -> Result<i32, GatewayError>;

    async fn forward_message(&self, spec: &ForwardSpec) -> Result<i32, GatewayError>;

    async fn edit_text(&self, spec: &EditSpec) -> Result<(), GatewayError>;

    async fn edit_caption(&self, spec: &EditSpec) -> Result<(), GatewayError>;

    async fn edit_reply_markup(&self, spec: &EditSpec) -> Result<(), GatewayError>;

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError>;
}

pub struct BotGateway {
    api: Api,
}

impl BotGateway {
    pub fn new() -> Self {
        let api = Api::new(
            &Config::telegram_base_url(),
            &Config::telegram_bot_token(),
        );

        Self { api }
    }

    pub fn with_api(api: Api) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }
}

impl Default for BotGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingGateway for BotGateway {
    fn backend_name(&self) -> &'static str {
        "bot"
    }

    async fn is_connected(&self) -> bool {
        self.api.get_me().await.is_ok()
    }

    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>, GatewayError> {
        chat_title_via(&self.api, chat_id).await
    }

    async fn send_text(&self, spec: &SendTextSpec) -> Result<i32, GatewayError> {
        send_text_via(&self.api, spec).await
    }

    async fn send_media(&self, spec: &SendMediaSpec) -> Result<i32, GatewayError> {
        send_media_via(&self.api, spec).await
    }

    async fn copy_message(&self, spec: &CopySpec) -> Result<i32, GatewayError> {
        copy_via(&self.api, spec).await
    }

    async fn forward_message(&self, spec: &ForwardSpec) -> Result<i32, GatewayError> {
        forward_via(&self.api, spec).await
    }

    async fn edit_text(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_text_via(&self.api, spec).await
    }

    async fn edit_caption(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_caption_via(&self.api, spec).await
    }

    async fn edit_reply_markup(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_reply_markup_via(&self.api, spec).await
    }

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError> {
        pin_via(&self.api, chat_id, message_id).await
    }
}

/// Delivery path operating as a full user account, reached through a
/// session-scoped gateway exposing the same wire surface under a different
/// base URL. Connectivity is probed on demand and cached so the engine can
/// downgrade userbot tasks when the session drops.
pub struct UserGateway {
    api: Api,
    connected: AtomicBool,
}

impl UserGateway {
    pub fn from_config() -> Option<Self> {
        let base_url = Config::userbot_base_url()?;
        let token = Config::userbot_session_token()?;

        let api = Api::new(&base_url, &token);

        Some(Self {
            api,
            connected: AtomicBool::new(false),
        })
    }

    pub fn with_api(api: Api) -> Self {
        Self {
            api,
            connected: AtomicBool::new(true),
        }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub async fn probe(&self) -> bool {
        let connected = self.api.get_me().await.is_ok();
        self.connected.store(connected, Ordering::Relaxed);

        connected
    }

    pub fn last_known_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessagingGateway for UserGateway {
    fn backend_name(&self) -> &'static str {
        "userbot"
    }

    async fn is_connected(&self) -> bool {
        self.probe().await
    }

    async fn chat_title(&self, chat_id: i64) -> Result<Option<String>, GatewayError> {
        chat_title_via(&self.api, chat_id).await
    }

    async fn send_text(&self, spec: &SendTextSpec) -> Result<i32, GatewayError> {
        send_text_via(&self.api, spec).await
    }

    async fn send_media(&self, spec: &SendMediaSpec) -> Result<i32, GatewayError> {
        send_media_via(&self.api, spec).await
    }

    async fn copy_message(&self, spec: &CopySpec) -> Result<i32, GatewayError> {
        copy_via(&self.api, spec).await
    }

    async fn forward_message(&self, spec: &ForwardSpec) -> Result<i32, GatewayError> {
        forward_via(&self.api, spec).await
    }

    async fn edit_text(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_text_via(&self.api, spec).await
    }

    async fn edit_caption(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_caption_via(&self.api, spec).await
    }

    async fn edit_reply_markup(&self, spec: &EditSpec) -> Result<(), GatewayError> {
        edit_reply_markup_via(&self.api, spec).await
    }

    async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError> {
        pin_via(&self.api, chat_id, message_id).await
    }
}

async fn send_text_via(api: &Api, spec: &SendTextSpec) -> Result<i32, GatewayError> {
    let preview_params = LinkPreviewOptions::builder()
        .is_disabled(!spec.link_preview)
        .build();

    let mut params = SendMessageParams::builder()
        .chat_id(spec.chat_id)
        .text(spec.text.clone())
        .parse_mode(ParseMode::Html)
        .link_preview_options(preview_params)
        .build();

    params.disable_notification = Some(spec.silent);
    params.reply_parameters = reply_parameters(spec.reply_to_message_id);
    params.reply_markup = spec
        .reply_markup
        .clone()
        .map(ReplyMarkup::InlineKeyboardMarkup);

    let response = api.send_message(&params).await?;

    Ok(response.result.message_id)
}

async fn send_media_via(api: &Api, spec: &SendMediaSpec) -> Result<i32, GatewayError> {
    let file = FileUpload::String(spec.file_id.clone());
    let markup = spec
        .reply_markup
        .clone()
        .map(ReplyMarkup::InlineKeyboardMarkup);
    let reply = reply_parameters(spec.reply_to_message_id);
    let silent = Some(spec.silent);

    let message = match spec.kind {
        MediaKind::Photo => {
            let mut params = SendPhotoParams::builder()
                .chat_id(spec.chat_id)
                .photo(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_photo(&params).await?.result
        }
        MediaKind::Video => {
            let mut params = SendVideoParams::builder()
                .chat_id(spec.chat_id)
                .video(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_video(&params).await?.result
        }
        MediaKind::Document => {
            let mut params = SendDocumentParams::builder()
                .chat_id(spec.chat_id)
                .document(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_document(&params).await?.result
        }
        MediaKind::Audio => {
            let mut params = SendAudioParams::builder()
                .chat_id(spec.chat_id)
                .audio(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_audio(&params).await?.result
        }
        MediaKind::Voice => {
            let mut params = SendVoiceParams::builder()
                .chat_id(spec.chat_id)
                .voice(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_voice(&params).await?.result
        }
        MediaKind::VideoNote => {
            let mut params = SendVideoNoteParams::builder()
                .chat_id(spec.chat_id)
                .video_note(file)
                .build();
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_video_note(&params).await?.result
        }
        MediaKind::Sticker => {
            let mut params = SendStickerParams::builder()
                .chat_id(spec.chat_id)
                .sticker(file)
                .build();
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_sticker(&params).await?.result
        }
        MediaKind::Animation => {
            let mut params = SendAnimationParams::builder()
                .chat_id(spec.chat_id)
                .animation(file)
                .build();
            params.caption = spec.caption.clone();
            params.parse_mode = Some(ParseMode::Html);
            params.reply_markup = markup;
            params.reply_parameters = reply;
            params.disable_notification = silent;

            api.send_animation(&params).await?.result
        }
        other => {
            return Err(GatewayError::Unsupported {
                what: format!("resending stored {other:?} media"),
            })
        }
    };

    Ok(message.message_id)
}

async fn copy_via(api: &Api, spec: &CopySpec) -> Result<i32, GatewayError> {
    let mut params = CopyMessageParams::builder()
        .chat_id(spec.chat_id)
        .from_chat_id(spec.from_chat_id)
        .message_id(spec.message_id)
        .build();

    params.disable_notification = Some(spec.silent);
    params.reply_parameters = reply_parameters(spec.reply_to_message_id);
    params.reply_markup = spec
        .reply_markup
        .clone()
        .map(ReplyMarkup::InlineKeyboardMarkup);

    if let Some(caption) = &spec.caption {
        params.caption = Some(caption.clone());
        params.parse_mode = Some(ParseMode::Html);
    }

    let response = api.copy_message(&params).await?;

    Ok(response.result.message_id)
}

async fn forward_via(api: &Api, spec: &ForwardSpec) -> Result<i32, GatewayError> {
    let mut params = ForwardMessageParams::builder()
        .chat_id(spec.chat_id)
        .from_chat_id(spec.from_chat_id)
        .message_id(spec.message_id)
        .build();

    params.disable_notification = Some(spec.silent);

    let response = api.forward_message(&params).await?;

    Ok(response.result.message_id)
}

async fn edit_text_via(api: &Api, spec: &EditSpec) -> Result<(), GatewayError> {
    let preview_params = LinkPreviewOptions::builder()
        .is_disabled(!spec.link_preview)
        .build();

    let mut params = EditMessageTextParams::builder()
        .text(spec.text.clone().unwrap_or_default())
        .build();

    params.chat_id = Some(spec.chat_id.into());
    params.message_id = Some(spec.message_id);
    params.parse_mode = Some(ParseMode::Html);
    params.link_preview_options = Some(preview_params);
    params.reply_markup = spec.reply_markup.clone();

    api.edit_message_text(&params).await?;

    Ok(())
}

async fn edit_caption_via(api: &Api, spec: &EditSpec) -> Result<(), GatewayError> {
    let mut params = EditMessageCaptionParams::builder().build();

    params.chat_id = Some(spec.chat_id.into());
    params.message_id = Some(spec.message_id);
    params.caption = spec.caption.clone();
    params.parse_mode = Some(ParseMode::Html);
    params.reply_markup = spec.reply_markup.clone();

    api.edit_message_caption(&params).await?;

    Ok(())
}

async fn edit_reply_markup_via(api: &Api, spec: &EditSpec) -> Result<(), GatewayError> {
    let mut params = EditMessageReplyMarkupParams::builder().build();

    params.chat_id = Some(spec.chat_id.into());
    params.message_id = Some(spec.message_id);
    params.reply_markup = spec.reply_markup.clone();

    api.edit_message_reply_markup(&params).await?;

    Ok(())
}

async fn pin_via(api: &Api, chat_id: i64, message_id: i32) -> Result<(), GatewayError> {
    let mut params = PinChatMessageParams::builder()
        .chat_id(chat_id)
        .message_id(message_id)
        .build();

    // pin silently
    params.disable_notification = Some(true);

    api.pin_chat_message(&params).await?;

    Ok(())
}

async fn chat_title_via(api: &Api, chat_id: i64) -> Result<Option<String>, GatewayError> {
    let params = GetChatParams::builder().chat_id(chat_id).build();

    let response = api.get_chat(&params).await?;
    let chat = &response["result"];

    let title = ["title", "username", "first_name"]
        .iter()
        .find_map(|field| chat.get(field).and_then(|value| value.as_str()))
        .map(str::to_string);

    Ok(title)
}

fn reply_parameters(reply_to_message_id: Option<i32>) -> Option<ReplyParameters> {
    reply_to_message_id
        .map(|message_id| ReplyParameters::builder().message_id(message_id).build())
}
