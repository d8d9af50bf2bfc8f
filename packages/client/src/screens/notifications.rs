//! Notification list, compact center and unread badge.

use common::NotificationKind;
use common::api::{ChangeKind, Notification, NotificationChange};
use futures::StreamExt;
use uuid::Uuid;

use crate::backend::NotificationStream;
use crate::context::AppContext;
use crate::error::ClientError;

/// Badge text for an unread count: nothing at zero, `99+` past 99.
pub fn badge_text(count: u64) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".into()),
    }
}

/// Where tapping a notification leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Task(Uuid),
    Submission(Uuid),
    Group(Uuid),
}

impl Route {
    pub fn for_notification(notification: &Notification) -> Option<Self> {
        let id = notification.related_id?;
        match notification.kind {
            NotificationKind::Task => Some(Self::Task(id)),
            NotificationKind::Submission | NotificationKind::Feedback => Some(Self::Submission(id)),
            NotificationKind::Group => Some(Self::Group(id)),
            NotificationKind::System => None,
        }
    }
}

/// Rows plus a locally maintained unread counter.
#[derive(Debug, Default)]
struct Feed {
    items: Vec<Notification>,
    unread: u64,
}

impl Feed {
    fn replace(&mut self, items: Vec<Notification>) {
        self.unread = items.iter().filter(|n| !n.is_read).count() as u64;
        self.items = items;
    }

    async fn mark_read(&mut self, ctx: &AppContext, id: Uuid) -> Result<(), ClientError> {
        let token = ctx.token().await?;
        ctx.backend.mark_read(&token, id).await?;
        if let Some(row) = self.items.iter_mut().find(|n| n.id == id) {
            if !row.is_read {
                row.is_read = true;
                self.unread = self.unread.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Fold a realtime change into the list. Inserts go on top, trimmed to `limit`.
    fn apply(&mut self, change: NotificationChange, limit: Option<usize>) {
        let record = change.record;
        match change.event {
            ChangeKind::Insert => {
                if self.items.iter().any(|n| n.id == record.id) {
                    return;
                }
                self.items.insert(0, record);
                if let Some(limit) = limit {
                    self.items.truncate(limit);
                }
                self.unread = self.items.iter().filter(|n| !n.is_read).count() as u64;
            }
            ChangeKind::Update => {
                if let Some(row) = self.items.iter_mut().find(|n| n.id == record.id) {
                    if !row.is_read && record.is_read {
                        self.unread = self.unread.saturating_sub(1);
                    }
                    *row = record;
                }
            }
        }
    }
}

/// Notifications tab: every row, newest first.
#[derive(Debug, Default)]
pub struct NotificationsScreen {
    feed: Feed,
    pub loading: bool,
}

impl NotificationsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Notification] {
        &self.feed.items
    }

    pub fn unread_count(&self) -> u64 {
        self.feed.unread
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        let result = async {
            let token = ctx.token().await?;
            ctx.backend.list_notifications(&token, None).await
        }
        .await;
        match result {
            Ok(items) => self.feed.replace(items),
            Err(e) => tracing::error!(error = %e, "Error fetching notifications"),
        }
        self.loading = false;
    }

    /// Mark one row read. Only the local row and counter change; nothing is refetched.
    pub async fn mark_read(&mut self, ctx: &AppContext, id: Uuid) {
        if let Err(e) = self.feed.mark_read(ctx, id).await {
            tracing::error!(notification_id = %id, error = %e, "Error marking notification as read");
        }
    }

    /// Mark everything read through the backend procedure. Skipped when nothing is unread.
    pub async fn mark_all_read(&mut self, ctx: &AppContext) {
        if self.feed.unread == 0 {
            return;
        }
        let result = async {
            let token = ctx.token().await?;
            ctx.backend.mark_all_read(&token).await
        }
        .await;
        match result {
            Ok(updated) => {
                tracing::debug!(updated, "Marked all notifications read");
                for row in &mut self.feed.items {
                    row.is_read = true;
                }
                self.feed.unread = 0;
            }
            Err(e) => tracing::error!(error = %e, "Error marking all notifications as read"),
        }
    }

    /// Mark the row read if needed and say where to go.
    pub async fn press(&mut self, ctx: &AppContext, notification: &Notification) -> Option<Route> {
        if !notification.is_read {
            self.mark_read(ctx, notification.id).await;
        }
        Route::for_notification(notification)
    }

    pub fn apply(&mut self, change: NotificationChange) {
        self.feed.apply(change, None);
    }

    pub fn badge(&self) -> Option<String> {
        badge_text(self.feed.unread)
    }
}

/// Slide-over panel with the latest few notifications.
#[derive(Default)]
pub struct NotificationCenter {
    feed: Feed,
    pub open: bool,
    subscription: Option<NotificationStream>,
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("feed", &self.feed)
            .field("open", &self.open)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Notification] {
        &self.feed.items
    }

    pub fn unread_count(&self) -> u64 {
        self.feed.unread
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        let result = async {
            let token = ctx.token().await?;
            ctx.backend
                .list_notifications(&token, Some(ctx.config.notification_center_limit))
                .await
        }
        .await;
        match result {
            Ok(items) => self.feed.replace(items),
            Err(e) => tracing::error!(error = %e, "Error fetching notifications"),
        }
    }

    /// Open or close the panel. Opening refetches.
    pub async fn toggle(&mut self, ctx: &AppContext) {
        self.open = !self.open;
        if self.open {
            self.load(ctx).await;
        }
    }

    /// Mark read and close the panel.
    pub async fn press(&mut self, ctx: &AppContext, notification: &Notification) -> Option<Route> {
        if !notification.is_read {
            if let Err(e) = self.feed.mark_read(ctx, notification.id).await {
                tracing::error!(error = %e, "Error marking notification as read");
            }
        }
        self.open = false;
        Route::for_notification(notification)
    }

    /// Start following realtime changes if the config asks for it.
    pub async fn subscribe(&mut self, ctx: &AppContext) -> Result<bool, ClientError> {
        if !ctx.config.realtime_notifications {
            return Ok(false);
        }
        let token = ctx.token().await?;
        self.subscription = Some(ctx.backend.subscribe_notifications(&token).await?);
        Ok(true)
    }

    /// Wait for the next realtime change and fold it in. `false` once the feed ends.
    pub async fn next_change(&mut self, ctx: &AppContext) -> bool {
        let Some(stream) = self.subscription.as_mut() else {
            return false;
        };
        match stream.next().await {
            Some(Ok(change)) => {
                let limit = usize::try_from(ctx.config.notification_center_limit).ok();
                self.feed.apply(change, limit);
                true
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Realtime notification error");
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.subscription = None;
    }
}

/// Tab-bar icon: just the unread count.
#[derive(Debug, Default)]
pub struct NotificationIcon {
    pub unread: u64,
}

impl NotificationIcon {
    pub async fn refresh(&mut self, ctx: &AppContext) {
        let result = async {
            let token = ctx.token().await?;
            ctx.backend.unread_count(&token).await
        }
        .await;
        match result {
            Ok(count) => self.unread = count,
            Err(e) => tracing::error!(error = %e, "Error fetching unread count"),
        }
    }

    pub fn badge(&self) -> Option<String> {
        badge_text(self.unread)
    }
}
