use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// The full settings view sent to observers: the resolved parameters of
/// the active method plus its name under the reserved `method` key.
pub type SettingsSnapshot = serde_json::Map<String, serde_json::Value>;

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("settings channel disconnected")]
    Disconnected,
}

pub struct SettingsReceiver {
    receiver: Receiver<SettingsSnapshot>,
}

impl SettingsReceiver {
    pub fn try_recv(&self) -> Result<Option<SettingsSnapshot>, NotifyError> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NotifyError::Disconnected),
        }
    }
}

pub(crate) fn settings_channel() -> (Sender<SettingsSnapshot>, SettingsReceiver) {
    let (sender, receiver) = mpsc::channel();
    (sender, SettingsReceiver { receiver })
}
