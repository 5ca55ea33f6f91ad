//! Hierarchical page records and their persistence boundary
//!
//! Pages form a tree; each record carries a denormalized `cached_url` built
//! from its ancestors' slugs. Persistence stays behind [`PageRepository`] so
//! the validation and rendering logic never touches a concrete store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page primary key
pub type PageId = i64;

/// A node in the page tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
	/// Primary key
	pub id: PageId,

	/// Parent page, `None` for root pages
	pub parent: Option<PageId>,

	/// Page title
	pub title: String,

	/// URL segment of this page
	pub slug: String,

	/// Full path, denormalized from ancestor slugs (always `/…/` shaped)
	pub cached_url: String,

	/// Whether the page is eligible for live URL resolution
	pub active: bool,

	/// Whether the page appears in navigation menus
	pub in_navigation: bool,

	/// Explicit absolute path superseding `cached_url`
	pub override_url: Option<String>,

	/// Redirect target, stored as a composite reference `<app>.<model>:<pk>`
	pub redirect_to: Option<String>,

	/// Key into the [`TemplateRegistry`](crate::templates::TemplateRegistry)
	pub template_key: String,

	/// Multi-site scoping key
	pub site: Option<i64>,

	/// Source-language page this one translates
	pub translation_of: Option<PageId>,

	/// Language code of this page
	pub language: Option<String>,
}

impl Page {
	/// The URL this page answers on: `override_url` when set, else `cached_url`.
	pub fn effective_url(&self) -> &str {
		self.override_url.as_deref().unwrap_or(&self.cached_url)
	}

	/// Lowercased model name, used by template cascades.
	pub fn type_name(&self) -> &'static str {
		"page"
	}

	/// Form-field values of this page, for prefilling a new child page.
	///
	/// The primary key and the denormalized URL are not form fields and are
	/// left out; `None` values are dropped rather than copied as nulls.
	pub fn to_field_map(&self) -> HashMap<String, serde_json::Value> {
		let mut data: HashMap<String, serde_json::Value> = match serde_json::to_value(self) {
			Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
			_ => HashMap::new(),
		};
		data.remove("id");
		data.remove("cached_url");
		data.retain(|_, value| !value.is_null());
		data
	}
}

/// Persistence boundary for pages
pub trait PageRepository {
	/// Fetch one page by primary key, `None` when absent
	fn get(&self, id: PageId) -> Option<Page>;

	/// All pages, in no particular order
	fn all(&self) -> Vec<Page>;
}

/// In-memory page store
#[derive(Debug, Clone)]
pub struct InMemoryPageRepository {
	pages: HashMap<PageId, Page>,
}

impl InMemoryPageRepository {
	/// Create an empty store
	pub fn new() -> Self {
		Self {
			pages: HashMap::new(),
		}
	}

	/// Insert or replace a page
	pub fn insert(&mut self, page: Page) {
		self.pages.insert(page.id, page);
	}
}

impl Default for InMemoryPageRepository {
	fn default() -> Self {
		Self::new()
	}
}

impl PageRepository for InMemoryPageRepository {
	fn get(&self, id: PageId) -> Option<Page> {
		self.pages.get(&id).cloned()
	}

	fn all(&self) -> Vec<Page> {
		self.pages.values().cloned().collect()
	}
}

/// Scoped view over the currently active pages
///
/// Built once per validation run: active pages only, minus the candidate
/// itself, restricted to one site when the submission carries a site.
pub struct ActivePages {
	pages: Vec<Page>,
}

impl ActivePages {
	/// Build the scoped active set.
	pub fn scoped(repo: &dyn PageRepository, exclude: Option<PageId>, site: Option<i64>) -> Self {
		let pages = repo
			.all()
			.into_iter()
			.filter(|page| page.active)
			.filter(|page| Some(page.id) != exclude)
			.filter(|page| site.is_none() || page.site == site)
			.collect();
		Self { pages }
	}

	/// Whether any page in the scope already holds `url` as its cached URL.
	pub fn contains_url(&self, url: &str) -> bool {
		self.pages.iter().any(|page| page.cached_url == url)
	}
}

/// Resolve the canonical source-language page of `page`.
///
/// Returns the page itself when it is not a translation, or when the link
/// target no longer exists.
pub fn original_translation(page: &Page, repo: &dyn PageRepository) -> Page {
	match page.translation_of.and_then(|id| repo.get(id)) {
		Some(original) => original,
		None => page.clone(),
	}
}

/// Find the translation of `page` in `language`, if one exists.
pub fn get_translation(page: &Page, language: &str, repo: &dyn PageRepository) -> Option<Page> {
	repo.all().into_iter().find(|candidate| {
		candidate.translation_of == Some(page.id) && candidate.language.as_deref() == Some(language)
	})
}
