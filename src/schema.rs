diesel::table! {
    tasks (id) {
        id -> Int8,
        user_id -> Int8,
        name -> Text,
        task_type -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sources (id) {
        id -> Int8,
        task_id -> Int8,
        chat_id -> Int8,
        name -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    targets (id) {
        id -> Int8,
        task_id -> Int8,
        chat_id -> Int8,
        name -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    task_settings (id) {
        id -> Int8,
        task_id -> Int8,
        forward_mode -> Text,
        allow_text -> Bool,
        allow_photos -> Bool,
        allow_videos -> Bool,
        allow_documents -> Bool,
        allow_audio -> Bool,
        allow_voice -> Bool,
        allow_video_notes -> Bool,
        allow_stickers -> Bool,
        allow_animations -> Bool,
        allow_contacts -> Bool,
        allow_locations -> Bool,
        allow_venues -> Bool,
        allow_polls -> Bool,
        allow_dice -> Bool,
        filter_forwarded -> Bool,
        filter_links -> Bool,
        filter_inline_buttons -> Bool,
        filter_duplicates -> Bool,
        filter_language -> Bool,
        language_filter_mode -> Text,
        allowed_languages -> Nullable<Jsonb>,
        keyword_filters -> Nullable<Jsonb>,
        length_filter_settings -> Nullable<Jsonb>,
        replace_text -> Nullable<Jsonb>,
        auto_translate -> Bool,
        target_language -> Nullable<Text>,
        text_cleaner_settings -> Nullable<Jsonb>,
        header_enabled -> Bool,
        header_text -> Nullable<Text>,
        footer_enabled -> Bool,
        footer_text -> Nullable<Text>,
        format_settings -> Nullable<Jsonb>,
        day_filter_enabled -> Bool,
        day_filter_settings -> Nullable<Jsonb>,
        working_hours_enabled -> Bool,
        start_hour -> Int4,
        end_hour -> Int4,
        utc_offset_minutes -> Int4,
        sending_limit_enabled -> Bool,
        sending_limit_settings -> Nullable<Jsonb>,
        delay_min -> Int4,
        delay_max -> Int4,
        remove_caption -> Bool,
        silent_mode -> Bool,
        pin_messages -> Bool,
        link_preview -> Bool,
        preserve_replies -> Bool,
        sync_edits -> Bool,
        manual_mode -> Bool,
        duplicate_signature -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    forwarding_logs (id) {
        id -> Int8,
        task_id -> Int8,
        source_chat_id -> Int8,
        target_chat_id -> Int8,
        source_message_id -> Int4,
        forwarded_message_id -> Nullable<Int4>,
        status -> Text,
        error_message -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    message_mappings (id) {
        id -> Int8,
        task_id -> Int8,
        source_chat_id -> Int8,
        source_message_id -> Int4,
        target_message_ids -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    duplicate_records (id) {
        id -> Int8,
        task_id -> Int8,
        content_hash -> Text,
        times_seen -> Int4,
        first_seen -> Timestamptz,
        last_seen -> Timestamptz,
    }
}

diesel::table! {
    pending_approvals (id) {
        id -> Int8,
        task_id -> Int8,
        source_chat_id -> Int8,
        source_message_id -> Int4,
        message_data -> Jsonb,
        status -> Text,
        approved_by -> Nullable<Int8>,
        decided_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sending_stats (id) {
        id -> Int8,
        task_id -> Int8,
        day -> Date,
        hour -> Int4,
        minute -> Int4,
        message_count -> Int4,
    }
}

diesel::joinable!(sources -> tasks (task_id));
diesel::joinable!(targets -> tasks (task_id));
diesel::joinable!(task_settings -> tasks (task_id));
diesel::joinable!(forwarding_logs -> tasks (task_id));
diesel::joinable!(message_mappings -> tasks (task_id));
diesel::joinable!(duplicate_records -> tasks (task_id));
diesel::joinable!(pending_approvals -> tasks (task_id));
diesel::joinable!(sending_stats -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    tasks,
    sources,
    targets,
    task_settings,
    forwarding_logs,
    message_mappings,
    duplicate_records,
    pending_approvals,
    sending_stats,
);
