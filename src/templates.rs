//! Page template descriptors and registry
//!
//! Templates are plain configuration: a keyed descriptor carrying the flags
//! the admin form needs (`singleton`, `enforce_leaf`, `child_template`).
//! The registry is an explicitly passed object, never process-wide state,
//! and can be deserialized straight from application configuration.

use crate::pages::{Page, PageId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Descriptor for one page layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
	/// Stable key pages reference via `template_key`
	pub key: String,

	/// Human-readable title
	pub title: String,

	/// Image shown next to the title in choice lists
	#[serde(default)]
	pub preview_image: Option<String>,

	/// At most one active page may use this template
	#[serde(default)]
	pub singleton: bool,

	/// Pages using this template may not have children
	#[serde(default)]
	pub enforce_leaf: bool,

	/// Suggested template for child pages
	#[serde(default)]
	pub child_template: Option<String>,
}

impl PageTemplate {
	/// Create a descriptor with no flags set
	pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			title: title.into(),
			..Self::default()
		}
	}

	/// Choice-list label: the preview image when one is set, else the title.
	pub fn choice_label(&self) -> String {
		match &self.preview_image {
			Some(image) => format!(r#"<img src="{}" alt="{}" /> {}"#, image, self.key, self.title),
			None => self.title.clone(),
		}
	}
}

/// Ordered collection of the templates available to a page model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateRegistry {
	templates: Vec<PageTemplate>,
}

impl TemplateRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self {
			templates: Vec::new(),
		}
	}

	/// Register a template; order of registration is the choice-list order
	pub fn register(&mut self, template: PageTemplate) {
		self.templates.push(template);
	}

	/// Look up a template by key
	pub fn get(&self, key: &str) -> Option<&PageTemplate> {
		self.templates.iter().find(|template| template.key == key)
	}

	/// Selectable `(key, label)` pairs for the page identified by `current`.
	///
	/// A singleton template already used by a different active page is
	/// omitted; the candidate's own use never excludes it.
	pub fn choices(&self, pages: &[Page], current: Option<PageId>) -> Vec<(String, String)> {
		let mut choices = Vec::new();
		for template in &self.templates {
			if template.singleton {
				let in_use_elsewhere = pages.iter().any(|page| {
					page.active && page.template_key == template.key && Some(page.id) != current
				});
				if in_use_elsewhere {
					debug!(key = %template.key, "singleton template in use, not selectable");
					continue;
				}
			}
			choices.push((template.key.clone(), template.choice_label()));
		}
		choices
	}
}
