use super::{ListItem, ObjectRecord};
use crate::error::{ConnectError, ListError};
use futures::StreamExt;
use object_store::{azure::MicrosoftAzureBuilder, path::Path, ObjectStore};
use tokio::{runtime::Runtime, sync::mpsc};

// Keeps the backend a bounded distance ahead of the consumer, so listings of
// any length run in constant memory.
const CHANNEL_DEPTH: usize = 1024;

/// Lists blobs in a cloud container under a prefix.
///
/// The storage client is async; its stream is drained on a private runtime and
/// handed over a bounded channel so callers see a plain blocking iterator.
/// Credentials are taken from the environment.
pub struct ContainerLister {
    records: mpsc::Receiver<ListItem>,
    _runtime: Runtime,
}

impl ContainerLister {
    pub fn connect(account: &str, container: &str, prefix: &str) -> Result<Self, ConnectError> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_account(account)
            .with_container_name(container)
            .build()?;

        let prefix = Path::from(prefix);
        let runtime = Runtime::new()?;
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);

        runtime.spawn(async move {
            let mut stream = store.list(Some(&prefix));

            while let Some(item) = stream.next().await {
                let item = item
                    .map(|meta| ObjectRecord {
                        path: meta.location.to_string(),
                        size: meta.size as u64,
                    })
                    .map_err(ListError::from_backend);

                // A backend error ends the listing; the consumer dropping its
                // end ends it too.
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(Self {
            records: rx,
            _runtime: runtime,
        })
    }
}

impl Iterator for ContainerLister {
    type Item = ListItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.blocking_recv()
    }
}
