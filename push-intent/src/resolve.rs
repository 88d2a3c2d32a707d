use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::BTreeSet;
use tracing;

use push_core::db::DbConnection;
use push_core::schema::{mytrips, profiles, tribe_members, tribes};
use push_core::{iso_to_flag, Alert, NotificationIntent, PushContext, PushError};

use crate::classify::Intent;

/// Denormalized display data for one user: flag emoji derived from their
/// origin code plus their full name. Either half may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Display {
    pub flag: String,
    pub name: String,
}

impl Display {
    /// "{flag} {name}" with empty halves dropped.
    fn joined(&self) -> String {
        join_nonempty([self.flag.as_str(), self.name.as_str()])
    }
}

#[derive(Debug, Clone, Default)]
struct TribeMeta {
    name: String,
    owner_id: Option<String>,
}

/// Turn a classified intent into the concrete recipient set and alert text.
/// Membership queries propagate errors; display-metadata lookups degrade to
/// empty strings so a missing profile never drops a notification.
pub async fn resolve(ctx: &PushContext, intent: &Intent) -> Result<NotificationIntent, PushError> {
    let mut conn = ctx.db_pool.get().await?;

    match intent {
        Intent::DirectMessage {
            sender_id,
            recipient_id,
            message,
        } => {
            let sender = profile_display(&mut conn, sender_id).await;
            Ok(NotificationIntent {
                alert: direct_message_alert(&sender, message),
                target_user_ids: targets([recipient_id.clone()], sender_id),
            })
        }
        Intent::TribeMessage {
            tribe_id,
            sender_id,
            message,
        } => {
            let members: Vec<String> = tribe_members::table
                .filter(tribe_members::tribe_id.eq(tribe_id))
                .select(tribe_members::user_id)
                .load(&mut conn)
                .await?;
            let tribe = tribe_meta(&mut conn, tribe_id).await;
            let sender = profile_display(&mut conn, sender_id).await;
            Ok(NotificationIntent {
                alert: tribe_message_alert(&tribe.name, &sender, message),
                target_user_ids: targets(members, sender_id),
            })
        }
        Intent::TripJoined {
            user_id,
            destination,
        } => {
            let travellers: Vec<String> = mytrips::table
                .filter(mytrips::destination.eq(destination))
                .select(mytrips::user_id)
                .load(&mut conn)
                .await?;
            let joiner = profile_display(&mut conn, user_id).await;
            Ok(NotificationIntent {
                alert: trip_joined_alert(&joiner, destination),
                target_user_ids: targets(travellers, user_id),
            })
        }
        Intent::TribeJoined { user_id, tribe_id } => {
            let mut members: Vec<String> = tribe_members::table
                .filter(tribe_members::tribe_id.eq(tribe_id))
                .select(tribe_members::user_id)
                .load(&mut conn)
                .await?;
            let tribe = tribe_meta(&mut conn, tribe_id).await;
            if let Some(owner) = &tribe.owner_id {
                members.push(owner.clone());
            }
            let joiner = profile_display(&mut conn, user_id).await;
            Ok(NotificationIntent {
                alert: tribe_joined_alert(&joiner, &tribe.name),
                target_user_ids: targets(members, user_id),
            })
        }
        Intent::FriendRequest {
            requester_id,
            receiver_id,
        } => {
            let requester = profile_display(&mut conn, requester_id).await;
            Ok(NotificationIntent {
                alert: friend_request_alert(&requester),
                target_user_ids: targets([receiver_id.clone()], requester_id),
            })
        }
        Intent::FriendRequestAccepted {
            requester_id,
            receiver_id,
        } => {
            // Directionality is deliberate: the original requester is told,
            // using the accepter's display data.
            let accepter = profile_display(&mut conn, receiver_id).await;
            Ok(NotificationIntent {
                alert: friend_request_accepted_alert(&accepter),
                target_user_ids: targets([requester_id.clone()], receiver_id),
            })
        }
    }
}

/// Deduplicate candidate recipients and drop the acting user.
fn targets(candidates: impl IntoIterator<Item = String>, actor: &str) -> BTreeSet<String> {
    candidates.into_iter().filter(|id| id != actor).collect()
}

pub fn direct_message_alert(sender: &Display, message: &str) -> Alert {
    Alert::Titled {
        title: sender.joined(),
        body: message.to_string(),
    }
}

pub fn tribe_message_alert(tribe_name: &str, sender: &Display, message: &str) -> Alert {
    let sender_display = sender.joined();
    // "{tribe} - {sender}", dropping the separator when either side is empty.
    let title = match (tribe_name.is_empty(), sender_display.is_empty()) {
        (false, false) => format!("{} - {}", tribe_name, sender_display),
        (false, true) => tribe_name.to_string(),
        (true, _) => sender_display,
    };
    Alert::Titled {
        title,
        body: message.to_string(),
    }
}

pub fn trip_joined_alert(joiner: &Display, destination: &str) -> Alert {
    Alert::Plain(join_nonempty([
        joiner.joined().as_str(),
        "just joined",
        destination,
    ]))
}

pub fn tribe_joined_alert(joiner: &Display, tribe_name: &str) -> Alert {
    let name = if joiner.name.is_empty() {
        "Someone"
    } else {
        joiner.name.as_str()
    };
    let who = join_nonempty([joiner.flag.as_str(), name]);
    let title = if tribe_name.is_empty() {
        format!("{} just joined your tribe", who)
    } else {
        format!("{} just joined your tribe ({})", who, tribe_name)
    };
    Alert::Titled {
        title,
        body: String::new(),
    }
}

pub fn friend_request_alert(requester: &Display) -> Alert {
    Alert::Plain(join_nonempty([requester.joined().as_str(), "added you"]))
}

pub fn friend_request_accepted_alert(accepter: &Display) -> Alert {
    Alert::Plain(join_nonempty([
        accepter.joined().as_str(),
        "accepted your request",
    ]))
}

fn join_nonempty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn profile_display(conn: &mut DbConnection, user_id: &str) -> Display {
    let row: Result<Option<(Option<String>, Option<String>)>, diesel::result::Error> =
        profiles::table
            .filter(profiles::user_id.eq(user_id))
            .select((profiles::full_name, profiles::origin))
            .first(conn)
            .await
            .optional();

    match row {
        Ok(Some((name, origin))) => Display {
            flag: iso_to_flag(origin.as_deref().unwrap_or("")),
            name: name.unwrap_or_default().trim().to_string(),
        },
        Ok(None) => Display::default(),
        Err(e) => {
            tracing::warn!("Profile lookup failed for {}: {}", user_id, e);
            Display::default()
        }
    }
}

async fn tribe_meta(conn: &mut DbConnection, tribe_id: &str) -> TribeMeta {
    let row: Result<Option<(Option<String>, Option<String>)>, diesel::result::Error> =
        tribes::table
            .filter(tribes::id.eq(tribe_id))
            .select((tribes::name, tribes::owner_id))
            .first(conn)
            .await
            .optional();

    match row {
        Ok(Some((name, owner_id))) => TribeMeta {
            name: name.unwrap_or_default().trim().to_string(),
            owner_id: owner_id.filter(|o| !o.is_empty()),
        },
        Ok(None) => TribeMeta::default(),
        Err(e) => {
            tracing::warn!("Tribe lookup failed for {}: {}", tribe_id, e);
            TribeMeta::default()
        }
    }
}
