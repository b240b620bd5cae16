use serde::Serialize;
use thiserror::Error;

use super::tracker::ProgressSnapshot;
use crate::download::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Failed | DownloadStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: DownloadStatus) -> bool {
        use DownloadStatus::*;
        matches!(
            (self, next),
            (Pending, Downloading)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Downloading, Paused)
                | (Downloading, Completed)
                | (Downloading, Failed)
                | (Downloading, Cancelled)
                | (Paused, Downloading)
                | (Paused, Failed)
                | (Paused, Cancelled)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot move a download from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: DownloadStatus,
    pub to: DownloadStatus,
}

/// One entry of the client's download list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItem {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub kind: MediaKind,
    pub quality: Option<String>,
    pub status: DownloadStatus,
    pub progress: u8,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub downloaded_size: Option<String>,
    pub total_size: Option<String>,
    pub error: Option<String>,
}

impl DownloadItem {
    pub fn new(video_id: &str, title: &str, kind: MediaKind, quality: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            video_id: video_id.to_string(),
            title: title.to_string(),
            kind,
            quality: quality.map(str::to_string),
            status: DownloadStatus::Pending,
            progress: 0,
            speed: None,
            eta: None,
            downloaded_size: None,
            total_size: None,
            error: None,
        }
    }

    pub fn transition(&mut self, next: DownloadStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Moves a failed or cancelled item back to pending; the caller then
    /// issues a fresh request for it.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        if !matches!(
            self.status,
            DownloadStatus::Failed | DownloadStatus::Cancelled
        ) {
            return Err(TransitionError {
                from: self.status,
                to: DownloadStatus::Pending,
            });
        }
        self.status = DownloadStatus::Pending;
        self.progress = 0;
        self.speed = None;
        self.eta = None;
        self.downloaded_size = None;
        self.total_size = None;
        self.error = None;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(DownloadStatus::Failed)?;
        self.error = Some(message.into());
        self.speed = None;
        self.eta = None;
        Ok(())
    }

    pub(crate) fn apply(&mut self, snapshot: &ProgressSnapshot) {
        self.progress = self.progress.max(snapshot.progress);
        self.speed = snapshot.speed.clone();
        self.eta = snapshot.eta.clone();
        self.downloaded_size = Some(snapshot.downloaded_size.clone());
        self.total_size = snapshot.total_size.clone();
    }
}

/// The visible download list. Items leave it only when dismissed.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    items: Vec<DownloadItem>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DownloadItem) -> String {
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    pub fn get(&self, id: &str) -> Option<&DownloadItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DownloadItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn dismiss(&mut self, id: &str) -> Option<DownloadItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[DownloadItem] {
        &self.items
    }

    pub fn active(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !item.status.is_terminal())
            .count()
    }
}
