use futures::{stream::BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Widest display still treated as a handset.
pub const HANDSET_MAX_WIDTH: u32 = 599;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportClass {
    pub handset: bool,
}

impl ViewportClass {
    pub const HANDSET: Self = Self { handset: true };
    pub const WIDE: Self = Self { handset: false };

    pub fn from_width(width: u32) -> Self {
        Self {
            handset: width <= HANDSET_MAX_WIDTH,
        }
    }
}

pub type ViewportStream = BoxStream<'static, ViewportClass>;

pub trait ViewportClassifier: Send + Sync {
    /// Emits the current classification and then every change.
    fn class_stream(&self) -> ViewportStream;
}

/// Classifier fed by whoever measures the display.
pub struct WatchViewport {
    tx: watch::Sender<ViewportClass>,
}

impl WatchViewport {
    pub fn new(initial: ViewportClass) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn from_width(width: u32) -> Self {
        Self::new(ViewportClass::from_width(width))
    }

    pub fn current(&self) -> ViewportClass {
        *self.tx.borrow()
    }

    /// Publishes `class` only when it differs from the current value.
    pub fn set(&self, class: ViewportClass) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == class {
                false
            } else {
                *current = class;
                true
            }
        })
    }

    pub fn set_width(&self, width: u32) -> bool {
        self.set(ViewportClass::from_width(width))
    }
}

impl ViewportClassifier for WatchViewport {
    fn class_stream(&self) -> ViewportStream {
        WatchStream::new(self.tx.subscribe()).boxed()
    }
}
