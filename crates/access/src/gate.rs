//! Content gating: the module body, or a notice in its place.

use askama::Template;
use tracing::debug;

use coursegate_catalog::Module;
use coursegate_core::{DomainResult, UserId};

use crate::AccessEvaluator;

/// Notice rendered instead of withheld module content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    PurchaseRequired {
        permalink: String,
        price: Option<String>,
    },
}

#[derive(Template)]
#[template(
    source = r#"<div class="module-access-notice">Please log in to view this content.</div>"#,
    ext = "html"
)]
struct LoginNoticeHtml;

/// Permalink and price come from the store's product record; both are
/// escaped by the template.
#[derive(Template)]
#[template(
    source = r#"<div class="module-access-notice">This module requires an additional purchase.<br><a href="{{ permalink }}" class="button">{{ label }}</a></div>"#,
    ext = "html"
)]
struct PurchaseNoticeHtml<'a> {
    permalink: &'a str,
    label: String,
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let rendered = match self {
            Notice::LoginRequired => LoginNoticeHtml.render_into(f),
            Notice::PurchaseRequired { permalink, price } => {
                let label = match price {
                    Some(price) => format!("Buy for {price}"),
                    None => "Buy now".to_string(),
                };
                PurchaseNoticeHtml { permalink, label }.render_into(f)
            }
        };
        rendered.map_err(|_| core::fmt::Error)
    }
}

impl AccessEvaluator {
    /// Return `content` if `viewer` may see `module`, otherwise a notice.
    ///
    /// Anonymous viewers always get the login notice. A gated module whose
    /// product cannot be resolved yields an empty string.
    pub fn restrict_content(
        &self,
        content: &str,
        module: &Module,
        viewer: Option<UserId>,
    ) -> DomainResult<String> {
        let Some(user_id) = viewer else {
            return Ok(Notice::LoginRequired.to_string());
        };

        let platform = self.platform();
        let Some(product_id) = platform.store.get_module_product(module.id)? else {
            return Ok(content.to_string());
        };

        let course_id = platform.tree.get_parent_course(module.id)?;
        if self.can_view_module(module.id, course_id, user_id, false)? {
            return Ok(content.to_string());
        }

        let Some(product) = platform.commerce.get_product(product_id)? else {
            debug!(module_id = %module.id, %product_id, "gated module product not found; withholding silently");
            return Ok(String::new());
        };

        Ok(Notice::PurchaseRequired {
            permalink: product.permalink,
            price: product.pricing.display(),
        }
        .to_string())
    }
}
