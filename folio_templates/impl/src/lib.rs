use std::sync::Arc;

use folio_templates_contracts::{Template, TemplateService, TEMPLATES};
use tera::Tera;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TemplateServiceImpl {
    tera: Arc<Tera>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateServiceConfig {
    /// Escape interpolated values in html templates. When disabled, values are
    /// embedded verbatim.
    pub escape_html: bool,
}

impl TemplateServiceImpl {
    pub fn new(config: TemplateServiceConfig) -> anyhow::Result<Self> {
        let mut tera = Tera::default();

        if !config.escape_html {
            tera.autoescape_on(vec![]);
        }

        for &(name, template) in TEMPLATES {
            tera.add_raw_template(name, template)?;
        }

        debug!(templates = TEMPLATES.len(), escape_html = config.escape_html, "loaded templates");

        Ok(Self { tera: tera.into() })
    }
}

impl TemplateService for TemplateServiceImpl {
    fn render<T: Template>(&self, template: &T) -> anyhow::Result<String> {
        let context = tera::Context::from_serialize(template)?;
        self.tera.render(T::NAME, &context).map_err(Into::into)
    }
}
