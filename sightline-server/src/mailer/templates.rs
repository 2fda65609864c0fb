use handlebars::Handlebars;
use serde::Serialize;

use super::MailError;

/// Templates compiled into the binary: (name, subject, text, html)
const BUILTIN: &[(&str, &str, &str, &str)] = &[(
    "sighting_notification",
    include_str!("../../templates/sighting_notification.subject.hbs"),
    include_str!("../../templates/sighting_notification.txt.hbs"),
    include_str!("../../templates/sighting_notification.html.hbs"),
)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub plain: String,
    pub html: String,
}

/// Compiled mail templates
///
/// Subject and plain-text parts render without HTML escaping; the HTML part
/// uses handlebars' default escaping. Strict mode is on in both, so a
/// missing context key is a render error rather than an empty string.
pub struct MailTemplates {
    text: Handlebars<'static>,
    html: Handlebars<'static>,
}

impl MailTemplates {
    /// Empty registry
    pub fn new() -> Self {
        let mut text = Handlebars::new();
        text.register_escape_fn(handlebars::no_escape);
        text.set_strict_mode(true);

        let mut html = Handlebars::new();
        html.set_strict_mode(true);

        Self { text, html }
    }

    /// Registry holding every embedded template
    pub fn builtin() -> Result<Self, MailError> {
        let mut templates = Self::new();
        for (name, subject, plain, html) in BUILTIN {
            templates.register(name, subject, plain, html)?;
        }
        Ok(templates)
    }

    pub fn register(&mut self, name: &str, subject: &str, plain: &str, html: &str) -> Result<(), MailError> {
        let compile = |e: handlebars::TemplateError| MailError::Template(format!("{}: {}", name, e));

        self.text
            .register_template_string(&format!("{}.subject", name), subject)
            .map_err(compile)?;
        self.text
            .register_template_string(&format!("{}.txt", name), plain)
            .map_err(compile)?;
        self.html
            .register_template_string(&format!("{}.html", name), html)
            .map_err(compile)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.text.has_template(&format!("{}.subject", name))
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<RenderedMessage, MailError> {
        if !self.has_template(name) {
            return Err(MailError::Template(format!("unknown template '{}'", name)));
        }
        let render = |e: handlebars::RenderError| MailError::Template(format!("{}: {}", name, e));

        let subject = self
            .text
            .render(&format!("{}.subject", name), data)
            .map_err(render)?;
        let plain = self.text.render(&format!("{}.txt", name), data).map_err(render)?;
        let html = self.html.render(&format!("{}.html", name), data).map_err(render)?;

        Ok(RenderedMessage {
            subject: subject.trim().to_string(),
            plain,
            html,
        })
    }
}

impl Default for MailTemplates {
    fn default() -> Self {
        Self::new()
    }
}
