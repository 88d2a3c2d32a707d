use diesel::{allow_tables_to_appear_in_same_query, table};

table! {
    profiles (user_id) {
        user_id -> Text,
        full_name -> Nullable<Text>,
        origin -> Nullable<Text>,
    }
}

table! {
    tribes (id) {
        id -> Text,
        name -> Nullable<Text>,
        owner_id -> Nullable<Text>,
    }
}

table! {
    tribe_members (id) {
        id -> BigInt,
        tribe_id -> Text,
        user_id -> Text,
    }
}

table! {
    mytrips (id) {
        id -> BigInt,
        user_id -> Text,
        destination -> Text,
        check_in -> Timestamptz,
    }
}

table! {
    device_tokens (id) {
        id -> BigInt,
        user_id -> Text,
        token -> Text,
    }
}

allow_tables_to_appear_in_same_query!(profiles, tribes, tribe_members, mytrips, device_tokens,);
