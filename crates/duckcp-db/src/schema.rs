diesel::table! {
    repositories (id) {
        id -> Integer,
        kind -> Text,
        code -> Text,
        properties -> Jsonb,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    storages (id) {
        id -> Integer,
        repository_id -> Integer,
        code -> Text,
        properties -> Jsonb,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    transformers (id) {
        id -> Integer,
        code -> Text,
        source_id -> Integer,
        target_id -> Integer,
        script_file -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tasks (id) {
        id -> Integer,
        code -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tasks_transformers (task_id, transformer_id) {
        task_id -> Integer,
        transformer_id -> Integer,
        sort -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    snapshots (storage_id) {
        storage_id -> Integer,
        checksum -> Text,
        records -> Jsonb,
        created_at -> Text,
    }
}

diesel::table! {
    credentials (platform_code, app_code) {
        platform_code -> Text,
        app_code -> Text,
        access_token -> Text,
        expired_at -> Text,
    }
}

diesel::joinable!(storages -> repositories (repository_id));
diesel::joinable!(transformers -> repositories (source_id));
diesel::joinable!(transformers -> storages (target_id));
diesel::joinable!(tasks_transformers -> tasks (task_id));
diesel::joinable!(tasks_transformers -> transformers (transformer_id));
diesel::joinable!(snapshots -> storages (storage_id));

diesel::allow_tables_to_appear_in_same_query!(
    repositories,
    storages,
    transformers,
    tasks,
    tasks_transformers,
    snapshots,
);
