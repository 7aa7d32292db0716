//! Component descriptors and loaded definitions.

use serde::Deserialize;

/// Describes a component to load.
///
/// Markup and styles may be supplied up front; anything missing is read
/// from the component's directory.
///
/// Descriptors can also be declared in host configuration:
///
/// ```
/// use skein_components::ComponentDescriptor;
///
/// let descriptor: ComponentDescriptor = serde_json::from_str(r#"{
///     "name": "card",
///     "type": "widgets",
///     "presenter": "CardPresenter"
/// }"#).unwrap();
///
/// assert_eq!(descriptor.kind(), "widgets");
/// assert_eq!(descriptor.presenter(), Some("CardPresenter"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentDescriptor {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    markup: Option<String>,
    #[serde(default)]
    styles: Option<Vec<String>>,
    #[serde(default)]
    presenter: Option<String>,
}

impl ComponentDescriptor {
    /// Creates a descriptor for component `name` of type `kind`.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            markup: None,
            styles: None,
            presenter: None,
        }
    }

    /// Supplies the markup instead of reading it.
    #[must_use]
    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }

    /// Supplies the style texts instead of reading them.
    #[must_use]
    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = Some(styles.into_iter().map(Into::into).collect());
        self
    }

    /// Declares the presenter class exported by the component's module.
    #[must_use]
    pub fn with_presenter(mut self, class_name: impl Into<String>) -> Self {
        self.presenter = Some(class_name.into());
        self
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component type, which selects its directory.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Supplied markup, if any.
    #[must_use]
    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    /// Supplied style texts, if any.
    #[must_use]
    pub fn styles(&self) -> Option<&[String]> {
        self.styles.as_deref()
    }

    /// Declared presenter class name, if any.
    #[must_use]
    pub fn presenter(&self) -> Option<&str> {
        self.presenter.as_deref()
    }
}

/// A loaded component definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedComponent {
    /// Template markup.
    pub markup: String,
    /// Style texts, in declaration order.
    pub styles: Vec<String>,
}
