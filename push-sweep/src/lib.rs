//! Scheduled trip-reminder sweep: the second entry point. Instead of reacting
//! to a change event, it scans upcoming trips and synthesizes reminders from
//! date arithmetic, then shares the token lookup and dispatch stages with the
//! event pipeline.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::BTreeSet;
use tracing;

use push_core::schema::mytrips;
use push_core::{Alert, DispatchReport, PushContext, PushError};
use push_delivery::{issue, ApnsClient, Push};
use push_intent::tokens_for;

/// Reminders fire on these exact day offsets only. A trip five days out gets
/// nothing; there is no window matching.
pub const REMINDER_DAYS: [i64; 5] = [14, 7, 3, 1, 0];

const LOOKAHEAD_DAYS: i64 = 15;

/// Whole UTC days between today and a trip's check-in, both floored to
/// midnight. Time-of-day never shifts the offset.
pub fn days_until(check_in: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (check_in.date_naive() - now.date_naive()).num_days()
}

/// Template message for an exact reminder offset.
pub fn reminder_message(days_out: i64, destination: &str) -> Option<String> {
    let message = match days_out {
        14 => format!("2 weeks until your trip to {}!", destination),
        7 => format!("1 week until your trip to {}!", destination),
        3 => format!("Only 3 days until your trip to {}!", destination),
        1 => format!("Your trip to {} starts tomorrow!", destination),
        0 => format!("Your trip to {} starts today!", destination),
        _ => return None,
    };
    Some(message)
}

/// Scan trips checking in within the next 15 days, build one reminder per
/// trip on a matching offset, and dispatch the whole batch under a single
/// signed assertion. No matching trips means no token query and no signing.
pub async fn sweep(ctx: &PushContext) -> Result<DispatchReport, PushError> {
    let apns_config = ctx.config.apns.resolved()?;

    let now = Utc::now();
    let window_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let window_end = window_start + Duration::days(LOOKAHEAD_DAYS);

    let mut conn = ctx.db_pool.get().await?;
    let trips: Vec<(String, String, DateTime<Utc>)> = mytrips::table
        .filter(mytrips::check_in.ge(window_start))
        .filter(mytrips::check_in.lt(window_end))
        .select((mytrips::user_id, mytrips::destination, mytrips::check_in))
        .load(&mut conn)
        .await?;
    drop(conn);

    let mut reminders: Vec<(String, Alert)> = Vec::new();
    for (user_id, destination, check_in) in trips {
        if let Some(message) = reminder_message(days_until(check_in, now), &destination) {
            reminders.push((user_id, Alert::Plain(message)));
        }
    }

    let user_ids: BTreeSet<String> = reminders.iter().map(|(user, _)| user.clone()).collect();
    let tokens = tokens_for(ctx, &user_ids).await?;

    let mut pushes = Vec::new();
    for (user_id, alert) in &reminders {
        if let Some(user_tokens) = tokens.get(user_id) {
            for token in user_tokens {
                pushes.push(Push {
                    token: token.clone(),
                    alert: alert.clone(),
                });
            }
        }
    }

    if pushes.is_empty() {
        tracing::debug!("No trip reminders due");
        return Ok(DispatchReport::default());
    }

    tracing::info!("Dispatching {} trip reminders", pushes.len());
    let assertion = issue(
        &apns_config.team_id,
        &apns_config.key_id,
        &apns_config.private_key,
    )?;
    let client = ApnsClient::new(&apns_config.host, &apns_config.bundle_id)?;
    Ok(client.dispatch(pushes, &assertion).await)
}
