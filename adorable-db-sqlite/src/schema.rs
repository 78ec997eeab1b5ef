///////////////////////////////////////////////////////////////////////
// Users
///////////////////////////////////////////////////////////////////////

table! {
    users (id) {
        id -> Text,
        username -> Text,
        email -> Text,
        email_confirmed -> Bool,
        password -> Text,
        role -> SmallInt,
        first_name -> Nullable<Text>,
        last_name -> Nullable<Text>,
        phone_number -> Nullable<Text>,
        bio -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        date_of_birth -> Nullable<Text>,
        language -> Text,
        timezone -> Text,
        push_enabled -> Bool,
        digest_enabled -> Bool,
        profile_public -> Bool,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

table! {
    device_tokens (user_id, token) {
        user_id -> Text,
        token -> Text,
        created_at -> BigInt,
    }
}

joinable!(device_tokens -> users (user_id));

table! {
    user_tokens (user_id, purpose) {
        user_id -> Text,
        purpose -> Text,
        nonce -> Text,
        expires_at -> BigInt,
    }
}

joinable!(user_tokens -> users (user_id));

///////////////////////////////////////////////////////////////////////
// Places
///////////////////////////////////////////////////////////////////////

table! {
    places (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        address -> Text,
        lat -> Nullable<Double>,
        lng -> Nullable<Double>,
        category -> Text,
        rating -> Double,
        total_ratings -> Integer,
        ranking_score -> Double,
        created_by -> Nullable<Text>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

table! {
    place_tags (place_id, tag) {
        place_id -> Text,
        tag -> Text,
    }
}

joinable!(place_tags -> places (place_id));

table! {
    place_reviews (id) {
        id -> Text,
        place_id -> Text,
        user_id -> Text,
        rating -> SmallInt,
        review -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

joinable!(place_reviews -> places (place_id));

table! {
    saved_places (user_id, place_id) {
        user_id -> Text,
        place_id -> Text,
        notes -> Text,
        saved_at -> BigInt,
    }
}

joinable!(saved_places -> places (place_id));

///////////////////////////////////////////////////////////////////////
// Locations
///////////////////////////////////////////////////////////////////////

table! {
    locations (id) {
        id -> Text,
        user_id -> Text,
        name -> Text,
        address -> Text,
        lat -> Nullable<Double>,
        lng -> Nullable<Double>,
        kind -> Text,
        is_primary -> Bool,
        notes -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

///////////////////////////////////////////////////////////////////////
// Social graph
///////////////////////////////////////////////////////////////////////

table! {
    connections (id) {
        id -> Text,
        follower_id -> Text,
        following_id -> Text,
        is_mutual -> Bool,
        created_at -> BigInt,
    }
}

table! {
    blocks (id) {
        id -> Text,
        blocker_id -> Text,
        blocked_id -> Text,
        reason -> Nullable<Text>,
        created_at -> BigInt,
    }
}

table! {
    reports (id) {
        id -> Text,
        reporter_id -> Text,
        reported_user_id -> Text,
        reason -> Text,
        description -> Text,
        status -> Text,
        admin_notes -> Nullable<Text>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

///////////////////////////////////////////////////////////////////////
// Chats
///////////////////////////////////////////////////////////////////////

table! {
    chats (id) {
        id -> Text,
        is_group_chat -> Bool,
        title -> Nullable<Text>,
        last_message -> Nullable<Text>,
        last_message_at -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

table! {
    chat_participants (chat_id, user_id) {
        chat_id -> Text,
        user_id -> Text,
        position -> Integer,
    }
}

joinable!(chat_participants -> chats (chat_id));

table! {
    messages (id) {
        id -> Text,
        chat_id -> Text,
        sender_id -> Text,
        content -> Text,
        attachment_url -> Nullable<Text>,
        attachment_mime_type -> Nullable<Text>,
        created_at -> BigInt,
    }
}

joinable!(messages -> chats (chat_id));

table! {
    message_reads (message_id, user_id) {
        message_id -> Text,
        user_id -> Text,
    }
}

joinable!(message_reads -> messages (message_id));

///////////////////////////////////////////////////////////////////////
// Notifications & activities
///////////////////////////////////////////////////////////////////////

table! {
    notifications (id) {
        id -> Text,
        user_id -> Text,
        kind -> Text,
        title -> Text,
        message -> Text,
        is_read -> Bool,
        action_url -> Nullable<Text>,
        created_at -> BigInt,
    }
}

table! {
    notification_data (notification_id, key) {
        notification_id -> Text,
        key -> Text,
        value -> Text,
    }
}

joinable!(notification_data -> notifications (notification_id));

table! {
    activities (id) {
        id -> Text,
        user_id -> Text,
        kind -> Text,
        target_user_id -> Nullable<Text>,
        target_place_id -> Nullable<Text>,
        created_at -> BigInt,
    }
}

table! {
    activity_data (activity_id, key) {
        activity_id -> Text,
        key -> Text,
        value -> Text,
    }
}

joinable!(activity_data -> activities (activity_id));

///////////////////////////////////////////////////////////////////////
// Files
///////////////////////////////////////////////////////////////////////

table! {
    files (id) {
        id -> Text,
        owner_id -> Text,
        storage_path -> Text,
        file_type -> Text,
        original_name -> Text,
        size -> BigInt,
        mime_type -> Text,
        title -> Text,
        description -> Text,
        is_public -> Bool,
        password -> Nullable<Text>,
        download_count -> BigInt,
        last_accessed -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

table! {
    file_tags (file_id, tag) {
        file_id -> Text,
        tag -> Text,
    }
}

joinable!(file_tags -> files (file_id));

table! {
    shared_files (id) {
        id -> Text,
        file_id -> Text,
        shared_by -> Text,
        shared_with -> Text,
        permission -> Text,
        can_reshare -> Bool,
        expires_at -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

joinable!(shared_files -> files (file_id));

///////////////////////////////////////////////////////////////////////
// Jobs
///////////////////////////////////////////////////////////////////////

table! {
    job_results (id) {
        id -> Text,
        job_name -> Text,
        payload -> Text,
        attempts -> Integer,
        status -> Text,
        last_error -> Nullable<Text>,
        finished_at -> BigInt,
    }
}

allow_tables_to_appear_in_same_query!(
    users,
    device_tokens,
    user_tokens,
    places,
    place_tags,
    place_reviews,
    saved_places,
    locations,
    connections,
    blocks,
    reports,
    chats,
    chat_participants,
    messages,
    message_reads,
    notifications,
    notification_data,
    activities,
    activity_data,
    files,
    file_tags,
    shared_files,
    job_results,
);
