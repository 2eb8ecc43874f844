use std::sync::Arc;

use crate::{DomElement, DomNode, ElementHandle, ElementInfo, HostError, HostPage};

/// Detection heuristics for one host application.
///
/// Swapping the adapter replaces every DOM-matching rule without touching
/// the run state machine.
#[async_trait::async_trait]
pub trait PageAdapter: Send + Sync {
    async fn find_prompt_field(
        &self,
        host: &dyn HostPage,
    ) -> Result<Option<ElementHandle>, HostError>;

    async fn find_submit_control(
        &self,
        host: &dyn HostPage,
    ) -> Result<Option<ElementHandle>, HostError>;

    /// A removed node that signals the progress indicator went away.
    fn is_completion_indicator_removal(&self, node: &DomNode) -> bool;

    /// An added node that is, or contains, the newest result tile.
    fn is_new_result_tile(&self, node: &DomNode) -> bool;

    fn result_tiles<'a>(&self, node: &'a DomNode) -> Vec<&'a DomElement>;

    fn has_selection_control(&self, tile: &DomElement) -> bool;

    /// Tiles that link to a running task rather than a finished result.
    fn is_task_placeholder(&self, tile: &DomElement) -> bool;

    fn is_native_selection_ui(&self, element: &DomElement) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
    /// Tried in order; the first enabled match wins.
    pub prompt_field_selectors: Vec<String>,
    pub submit_primary: String,
    /// Tried in order after the primary; candidates must carry a keyword.
    pub submit_fallbacks: Vec<String>,
    pub submit_keywords: Vec<String>,
    pub progress_class_fragments: Vec<String>,
    pub tile_index_attr: String,
    pub tile_class_fragments: Vec<String>,
    /// Class carried by the overlay control this tool adds to tiles.
    pub own_control_class: String,
    pub task_href_fragment: String,
    pub native_selection_class_fragments: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            prompt_field_selectors: strings(&[
                r#"textarea[placeholder*="Describe"]"#,
                r#"textarea[placeholder*="describe"]"#,
                r#"textarea[class*="prompt"]"#,
                "textarea[placeholder]",
                "textarea",
            ]),
            submit_primary: r#"button[aria-label*="Generate"]"#.to_string(),
            submit_fallbacks: strings(&[
                r#"button[type="submit"]"#,
                r#"button[class*="generate"]"#,
                r#"button[class*="submit"]"#,
                "form button",
                "button",
            ]),
            submit_keywords: strings(&["generate", "create", "submit", "send"]),
            progress_class_fragments: strings(&["circular", "progress", "spinner"]),
            tile_index_attr: "data-index".to_string(),
            tile_class_fragments: strings(&["result-tile", "media-tile"]),
            own_control_class: "genrun-select".to_string(),
            task_href_fragment: "/task/".to_string(),
            native_selection_class_fragments: strings(&["selection-indicator", "select-checkbox"]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicAdapter {
    settings: MatchSettings,
}

impl HeuristicAdapter {
    pub fn new(settings: MatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    fn has_keyword(&self, candidate: &ElementInfo) -> bool {
        let text = candidate.text.to_ascii_lowercase();
        self.settings
            .submit_keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_ascii_lowercase()))
    }

    fn is_progress_element(&self, element: &DomElement) -> bool {
        element.attr("role") == Some("progressbar")
            || self
                .settings
                .progress_class_fragments
                .iter()
                .any(|fragment| element.class_contains(fragment))
    }

    fn is_tile(&self, element: &DomElement) -> bool {
        element.attr(&self.settings.tile_index_attr).is_some()
            || self
                .settings
                .tile_class_fragments
                .iter()
                .any(|fragment| element.class_contains(fragment))
    }
}

#[async_trait::async_trait]
impl PageAdapter for HeuristicAdapter {
    async fn find_prompt_field(
        &self,
        host: &dyn HostPage,
    ) -> Result<Option<ElementHandle>, HostError> {
        for selector in &self.settings.prompt_field_selectors {
            let found = host.query(selector).await?;
            if let Some(field) = found.into_iter().find(|info| !info.disabled) {
                return Ok(Some(field.handle));
            }
        }
        Ok(None)
    }

    async fn find_submit_control(
        &self,
        host: &dyn HostPage,
    ) -> Result<Option<ElementHandle>, HostError> {
        let primary = host.query(&self.settings.submit_primary).await?;
        if let Some(control) = primary.into_iter().find(|info| !info.disabled) {
            return Ok(Some(control.handle));
        }
        for selector in &self.settings.submit_fallbacks {
            let found = host.query(selector).await?;
            if let Some(control) = found
                .into_iter()
                .find(|info| !info.disabled && self.has_keyword(info))
            {
                return Ok(Some(control.handle));
            }
        }
        Ok(None)
    }

    fn is_completion_indicator_removal(&self, node: &DomNode) -> bool {
        is_bare_percentage(node.text_content().trim())
            || node.elements().into_iter().any(|el| self.is_progress_element(el))
    }

    fn is_new_result_tile(&self, node: &DomNode) -> bool {
        node.elements()
            .into_iter()
            .any(|el| el.attr(&self.settings.tile_index_attr) == Some("0"))
    }

    fn result_tiles<'a>(&self, node: &'a DomNode) -> Vec<&'a DomElement> {
        node.elements()
            .into_iter()
            .filter(|el| self.is_tile(el))
            .collect()
    }

    fn has_selection_control(&self, tile: &DomElement) -> bool {
        tile.elements()
            .into_iter()
            .any(|el| el.has_class(&self.settings.own_control_class))
    }

    fn is_task_placeholder(&self, tile: &DomElement) -> bool {
        tile.elements().into_iter().any(|el| {
            el.is("a")
                && el
                    .attr("href")
                    .is_some_and(|href| href.contains(&self.settings.task_href_fragment))
        })
    }

    fn is_native_selection_ui(&self, element: &DomElement) -> bool {
        if element.has_class(&self.settings.own_control_class) {
            return false;
        }
        let checkbox = element.is("input") && element.attr("type") == Some("checkbox");
        checkbox
            || self
                .settings
                .native_selection_class_fragments
                .iter()
                .any(|fragment| element.class_contains(fragment))
    }
}

/// `"73%"`-style text: one to three digits followed by a percent sign.
fn is_bare_percentage(text: &str) -> bool {
    text.strip_suffix('%').is_some_and(|digits| {
        (1..=3).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Host page together with the heuristics used to read it.
#[derive(Clone)]
pub struct Page {
    pub host: Arc<dyn HostPage>,
    pub adapter: Arc<dyn PageAdapter>,
}

impl Page {
    pub fn new(host: Arc<dyn HostPage>, adapter: Arc<dyn PageAdapter>) -> Self {
        Self { host, adapter }
    }

    pub async fn find_prompt_field(&self) -> Result<Option<ElementHandle>, HostError> {
        self.adapter.find_prompt_field(self.host.as_ref()).await
    }

    pub async fn find_submit_control(&self) -> Result<Option<ElementHandle>, HostError> {
        self.adapter.find_submit_control(self.host.as_ref()).await
    }
}
