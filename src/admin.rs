//! Page admin form logic
//!
//! [`PageAdminForm`] carries the cross-field checks a page submission must
//! pass before it may be persisted: URL uniqueness among active pages,
//! parent/child attachment rules, and normalization of redirect targets.
//! It also expands initial form values from a parent page or a translation
//! source. Field-level validation (types, required fields) is the host
//! form layer's job; this form starts from already field-cleaned values.

use crate::pages::{ActivePages, PageId, PageRepository, get_translation, original_translation};
use crate::templates::TemplateRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Fields that are never copied when prefilling from a parent page
pub const NEVER_COPY_FIELDS: [&str; 8] = [
	"title",
	"slug",
	"parent",
	"active",
	"override_url",
	"translation_of",
	"_content_title",
	"_page_title",
];

static REDIRECT_TO_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?P<app>\w+)\.(?P<model>\w+):(?P<pk>\d+)$").expect("valid redirect pattern")
});

static BARE_PK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid pk pattern"));

/// Identifies the model that bare-pk redirect targets are resolved against
#[derive(Debug, Clone)]
pub struct ModelOpts {
	/// Application label, first half of the composite reference
	pub app_label: String,

	/// Model name, second half of the composite reference
	pub model_name: String,
}

impl Default for ModelOpts {
	fn default() -> Self {
		Self {
			app_label: "page".to_string(),
			model_name: "page".to_string(),
		}
	}
}

/// Admin form for one page submission
///
/// Holds the submitted (field-cleaned) data and the per-field error lists
/// accumulated by [`clean`](PageAdminForm::clean). Errors never raise; the
/// caller re-renders the form with them.
pub struct PageAdminForm {
	instance: Option<PageId>,
	opts: ModelOpts,
	cleaned_data: HashMap<String, Value>,
	errors: HashMap<String, Vec<String>>,
}

impl PageAdminForm {
	/// Form for creating a new page
	pub fn new(data: HashMap<String, Value>) -> Self {
		Self {
			instance: None,
			opts: ModelOpts::default(),
			cleaned_data: data,
			errors: HashMap::new(),
		}
	}

	/// Form for editing the existing page `instance`
	pub fn for_instance(instance: PageId, data: HashMap<String, Value>) -> Self {
		Self {
			instance: Some(instance),
			..Self::new(data)
		}
	}

	/// Override the model identity used for redirect-target normalization
	pub fn with_opts(mut self, opts: ModelOpts) -> Self {
		self.opts = opts;
		self
	}

	/// Record a field error, as the host form layer does for field-level
	/// failures. Any pre-existing error makes [`clean`](PageAdminForm::clean)
	/// skip the cross-field checks.
	pub fn add_error(&mut self, field: &str, message: &str) {
		self.errors
			.entry(field.to_string())
			.or_default()
			.push(message.to_string());
	}

	/// The (possibly trimmed) cleaned values
	pub fn cleaned_data(&self) -> &HashMap<String, Value> {
		&self.cleaned_data
	}

	/// Accumulated per-field error messages
	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		&self.errors
	}

	/// Run the cross-field checks; `true` when no errors remain.
	///
	/// Fields that fail a check are removed from the cleaned data so the
	/// user must resolve them on re-render.
	pub fn clean(&mut self, repo: &dyn PageRepository, templates: &TemplateRegistry) -> bool {
		// Let the user correct field-level errors first.
		if !self.errors.is_empty() {
			return false;
		}

		let site = self.cleaned_data.get("site").and_then(Value::as_i64);
		let active_pages = ActivePages::scoped(repo, self.instance, site);

		// Convert a bare pk in redirect_to to something nicer for the future.
		let redirect_to = self
			.cleaned_data
			.get("redirect_to")
			.and_then(Value::as_str)
			.map(str::to_owned);
		if let Some(redirect_to) = redirect_to
			&& BARE_PK_RE.is_match(&redirect_to)
		{
			let composite = format!(
				"{}.{}:{}",
				self.opts.app_label, self.opts.model_name, redirect_to
			);
			self.cleaned_data
				.insert("redirect_to".to_string(), Value::String(composite));
		}

		// An inactive page cannot collide on URL with active pages. Only the
		// flag is checked, not any other activity filters: two pages that
		// won't really be active at the same time must not trip validation.
		if !self
			.cleaned_data
			.get("active")
			.and_then(Value::as_bool)
			.unwrap_or(false)
		{
			return true;
		}

		let override_url = self
			.cleaned_data
			.get("override_url")
			.and_then(Value::as_str)
			.map(str::to_owned);
		if let Some(override_url) = override_url
			&& !override_url.is_empty()
		{
			if active_pages.contains_url(&override_url) {
				self.add_error(
					"override_url",
					"This URL is already taken by an active page.",
				);
				self.cleaned_data.remove("override_url");
			}
			return self.errors.is_empty();
		}

		// When editing, validate against the persisted parent; a parent
		// change submitted in the same request is not committed yet.
		let parent = match self.instance {
			Some(id) => repo.get(id).and_then(|page| page.parent),
			None => self.cleaned_data.get("parent").and_then(Value::as_i64),
		}
		.and_then(|parent_id| repo.get(parent_id));

		let slug = self
			.cleaned_data
			.get("slug")
			.and_then(Value::as_str)
			.unwrap_or("")
			.to_owned();
		let new_url = match &parent {
			Some(parent) => format!("{}{}/", parent.cached_url, slug),
			None => format!("/{}/", slug),
		};

		if active_pages.contains_url(&new_url) {
			debug!(url = %new_url, "computed URL already taken by an active page");
			self.add_error("active", "This URL is already taken by another active page.");
			self.cleaned_data.remove("active");
		}

		if let Some(parent) = &parent
			&& templates
				.get(&parent.template_key)
				.is_some_and(|template| template.enforce_leaf)
		{
			self.add_error("parent", "This page does not allow attachment of child pages");
			self.cleaned_data.remove("parent");
		}

		self.errors.is_empty()
	}

	/// Expand initial form values from a parent page or a translation source.
	///
	/// With a `parent` entry, the parent's field values seed the new child
	/// page, minus the caller's `exclude_from_copy` set and
	/// [`NEVER_COPY_FIELDS`]; explicit initial values win, and the parent
	/// template's `child_template` (when set) picks the new `template_key`.
	///
	/// With a `translation_of` entry, the source's canonical original seeds
	/// the linkage, template, activity and navigation flags, and the
	/// original's parent is mapped to its translation in the target language
	/// when one exists.
	///
	/// A missing referenced page leaves the initial values untouched.
	pub fn prefill(
		initial: HashMap<String, Value>,
		repo: &dyn PageRepository,
		templates: &TemplateRegistry,
		exclude_from_copy: &[&str],
	) -> HashMap<String, Value> {
		if let Some(parent_id) = initial.get("parent").and_then(Value::as_i64) {
			let Some(parent) = repo.get(parent_id) else {
				debug!(parent = parent_id, "prefill parent missing, keeping initial as-is");
				return initial;
			};

			let mut data = parent.to_field_map();
			for field in exclude_from_copy {
				data.remove(*field);
			}
			for field in NEVER_COPY_FIELDS {
				data.remove(field);
			}
			data.extend(initial);
			if let Some(child_template) = templates
				.get(&parent.template_key)
				.and_then(|template| template.child_template.clone())
			{
				data.insert("template_key".to_string(), Value::String(child_template));
			}
			return data;
		}

		if let Some(source_id) = initial.get("translation_of").and_then(Value::as_i64) {
			let Some(source) = repo.get(source_id) else {
				debug!(source = source_id, "prefill translation source missing, keeping initial as-is");
				return initial;
			};
			let original = original_translation(&source, repo);

			let mut data = HashMap::from([
				("translation_of".to_string(), Value::from(original.id)),
				(
					"template_key".to_string(),
					Value::String(original.template_key.clone()),
				),
				("active".to_string(), Value::Bool(original.active)),
				(
					"in_navigation".to_string(),
					Value::Bool(original.in_navigation),
				),
			]);

			if let Some(parent) = original.parent.and_then(|id| repo.get(id))
				&& let Some(language) = initial.get("language").and_then(Value::as_str)
			{
				// The translation may not exist; that is fine.
				if let Some(translated) = get_translation(&parent, language, repo) {
					data.insert("parent".to_string(), Value::from(translated.id));
				}
			}

			data.extend(initial);
			return data;
		}

		initial
	}
}

/// Fetches display data for instances of one referenced model
pub trait LabelSource: Send + Sync {
	/// Display label and absolute URL of the instance with primary key `pk`
	fn label(&self, pk: i64) -> Option<(String, String)>;
}

/// Typed lookup from `"<app>.<model>"` identifiers to their accessors
pub struct ModelRegistry {
	models: HashMap<String, Box<dyn LabelSource>>,
}

impl ModelRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self {
			models: HashMap::new(),
		}
	}

	/// Register the accessor for `<app_label>.<model_name>`
	pub fn register<S: LabelSource + 'static>(
		&mut self,
		app_label: &str,
		model_name: &str,
		source: S,
	) {
		self.models
			.insert(format!("{app_label}.{model_name}"), Box::new(source));
	}

	/// Look up an accessor by its composite identifier
	pub fn get(&self, ident: &str) -> Option<&dyn LabelSource> {
		self.models.get(ident).map(|source| source.as_ref())
	}
}

impl Default for ModelRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Raw-id picker widget for the `redirect_to` field
///
/// Renders a human-readable label for a stored composite reference of the
/// form `<app>.<model>:<pk>`.
pub struct RedirectToWidget<'a> {
	registry: &'a ModelRegistry,
}

impl<'a> RedirectToWidget<'a> {
	/// Widget resolving references through `registry`
	pub fn new(registry: &'a ModelRegistry) -> Self {
		Self { registry }
	}

	/// Label markup for `value`, or an empty string when the reference does
	/// not parse or does not resolve.
	pub fn label_for_value(&self, value: &str) -> String {
		let Some(captures) = REDIRECT_TO_RE.captures(value) else {
			return String::new();
		};
		let ident = format!("{}.{}", &captures["app"], &captures["model"]);
		let Ok(pk) = captures["pk"].parse::<i64>() else {
			return String::new();
		};

		match self.registry.get(&ident).and_then(|source| source.label(pk)) {
			Some((display, url)) => format!("&nbsp;<strong>{display} ({url})</strong>"),
			None => String::new(),
		}
	}
}

impl LabelSource for crate::pages::InMemoryPageRepository {
	fn label(&self, pk: i64) -> Option<(String, String)> {
		self.get(pk)
			.map(|page| (page.title.clone(), page.effective_url().to_string()))
	}
}
