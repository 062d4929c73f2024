use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use crate::constants::messages;
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::notification::{NewNotification, Notification, NotificationType};
use crate::page::{Page, PageRequest};
use crate::traits::{EventSink, NotificationStore};

/// Hours covered by the "recent" notification listing.
const RECENT_HOURS: i64 = 24;

/// Stores notifications and pushes new ones to connected clients.
#[derive(Clone)]
pub struct NotificationService<N, E>
where
    N: NotificationStore,
    E: EventSink,
{
    store: N,
    sink: E,
}

impl<N, E> NotificationService<N, E>
where
    N: NotificationStore,
    E: EventSink,
{
    pub fn new(store: N, sink: E) -> Self {
        Self { store, sink }
    }

    pub async fn notify(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let stored = self.store.create_notification(&notification).await?;
        tracing::debug!(
            notification_id = stored.id,
            user_id = %stored.user_id,
            kind = %stored.notification_type,
            "Created notification"
        );
        self.sink.publish(DomainEvent::Notification(stored.clone()));
        Ok(stored)
    }

    /// Push an event to live subscribers without storing anything.
    pub fn publish(&self, event: DomainEvent) {
        self.sink.publish(event);
    }

    /// Like [`notify`](Self::notify) for side effects of an operation that
    /// already succeeded: failures are logged, not returned.
    pub async fn send(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        if let Err(e) = self.notify(notification).await {
            tracing::warn!(%user_id, error = %e, "Failed to deliver notification");
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        kind: Option<NotificationType>,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        self.store
            .list_notifications(user_id, kind, unread_only, page)
            .await
    }

    /// Unread notifications from the last day.
    pub async fn recent_unread(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let since = Utc::now() - TimeDelta::hours(RECENT_HOURS);
        self.store.unread_since(user_id, since).await
    }

    pub async fn get(&self, user_id: Uuid, id: i64) -> Result<Notification, AppError> {
        let notification = self
            .store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::NOTIFICATION_NOT_FOUND.into()))?;
        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "you can only access your own notifications".into(),
            ));
        }
        Ok(notification)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.store.unread_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, id: i64) -> Result<Notification, AppError> {
        let notification = self.get(user_id, id).await?;
        if notification.is_read {
            return Ok(notification);
        }
        self.store.mark_read(id, Utc::now()).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.store.mark_all_read(user_id, Utc::now()).await
    }

    pub async fn delete(&self, user_id: Uuid, id: i64) -> Result<(), AppError> {
        self.get(user_id, id).await?;
        self.store.delete_notification(id).await
    }

    pub async fn delete_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.store.delete_all_notifications(user_id).await
    }

    /// Delete notifications older than `retention`.
    pub async fn cleanup(&self, retention: TimeDelta) -> Result<u64, AppError> {
        let removed = self
            .store
            .delete_notifications_before(Utc::now() - retention)
            .await?;
        if removed > 0 {
            tracing::info!(removed, "Purged old notifications");
        }
        Ok(removed)
    }
}
