use std::time::Duration;

use genrun_logging::{run_debug, run_trace, run_warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::wait::settle;
use crate::{BridgeError, DomEvent, ElementHandle, FrameworkHandler, HostError, HostPage, Page};

/// Writes into framework-managed controls and presses framework-managed buttons.
#[derive(Debug, Clone)]
pub struct DomBridge {
    poll_interval: Duration,
}

impl DomBridge {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Sets `text` on a field whose value setter is overridden by the UI framework.
    ///
    /// Order: native setter, `input` and `change` events, then the
    /// framework's own change handler when the element exposes one. A failing
    /// handler is logged and the native events stand alone.
    pub async fn set_managed_text_value(
        &self,
        host: &dyn HostPage,
        field: ElementHandle,
        text: &str,
    ) -> Result<(), HostError> {
        host.native_set_value(field, text).await?;
        host.dispatch(field, DomEvent::Input).await?;
        host.dispatch(field, DomEvent::Change).await?;

        let handler = FrameworkHandler::Change {
            value: text.to_string(),
        };
        match host.invoke_framework_handler(field, handler).await {
            Ok(true) => run_trace!("framework change handler ran on {}", field),
            Ok(false) => run_trace!("no framework handler registry on {}", field),
            Err(err) => run_warn!("{}; relying on native events", err),
        }

        let value = host.read_value(field).await?;
        run_debug!("field {} now holds {} chars: {:?}", field, value.chars().count(), value);
        Ok(())
    }

    /// Clicks through the framework's click handler, falling back to a native click.
    pub async fn click(
        &self,
        host: &dyn HostPage,
        control: ElementHandle,
    ) -> Result<(), HostError> {
        match host
            .invoke_framework_handler(control, FrameworkHandler::Click)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => host.dispatch(control, DomEvent::Click).await,
            Err(err) => {
                run_warn!("{}; dispatching native click", err);
                host.dispatch(control, DomEvent::Click).await
            }
        }
    }

    /// Waits up to `wait_budget` for an enabled submit control and clicks it.
    pub async fn invoke_submit(
        &self,
        page: &Page,
        wait_budget: Duration,
        cancel: &CancellationToken,
    ) -> Result<ElementHandle, BridgeError> {
        let deadline = Instant::now() + wait_budget;
        loop {
            if cancel.is_cancelled() {
                return Err(BridgeError::Cancelled);
            }
            if let Some(control) = page.find_submit_control().await? {
                self.click(page.host.as_ref(), control).await?;
                run_debug!("clicked submit control {}", control);
                return Ok(control);
            }
            if Instant::now() >= deadline {
                return Err(BridgeError::SubmitControlNotFound(wait_budget));
            }
            if !settle(self.poll_interval, cancel).await {
                return Err(BridgeError::Cancelled);
            }
        }
    }
}
