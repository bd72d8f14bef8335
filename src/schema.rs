diesel::table! {
    users (username) {
        username -> Text,
        password -> Binary,
        profile_image -> Text,
    }
}
