//! Comments content block
//!
//! A per-page content block that shows a comment form and list. Comments
//! themselves belong to an external comment subsystem reached through
//! [`CommentBackend`]; this block only decides whether a submission should
//! be forwarded there and which template fragment to render.
//!
//! Comments always attach to the canonical source-language page, so a
//! translated page and its original share one comment thread.

use crate::error::{CmsError, CmsResult};
use crate::pages::{Page, PageId, PageRepository, original_translation};
use async_trait::async_trait;
use hyper::Method;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

/// First extra path segment that marks a comment submission
const POST_COMMENT_SEGMENT: &str = "post-comment";

/// The slice of an inbound request this crate needs
///
/// `extra_path` holds the path segments beyond the owning page's own URL;
/// a submission arrives as a POST whose first extra segment is
/// `post-comment`.
#[derive(Debug, Clone)]
pub struct CmsRequest {
	/// HTTP method
	pub method: Method,

	/// Parsed POST body
	pub post: HashMap<String, Value>,

	/// Path segments beyond the page URL
	pub extra_path: Vec<String>,
}

impl CmsRequest {
	/// A plain GET request with no extra path
	pub fn get() -> Self {
		Self {
			method: Method::GET,
			post: HashMap::new(),
			extra_path: Vec::new(),
		}
	}

	/// A POST request carrying `data` under the given extra path
	pub fn post(data: HashMap<String, Value>, extra_path: Vec<String>) -> Self {
		Self {
			method: Method::POST,
			post: data,
			extra_path,
		}
	}

	fn is_post(&self) -> bool {
		self.method == Method::POST
	}
}

/// What the external comment subsystem did with a submission
#[derive(Debug, Clone, PartialEq)]
pub enum CommentPostOutcome {
	/// The comment was accepted; the client is redirected to the given location
	Redirect(String),

	/// Validation failed; carries the rendered error response
	Invalid(String),
}

/// Boundary to the external comment subsystem
#[async_trait]
pub trait CommentBackend: Send + Sync {
	/// Forward a comment submission
	async fn post_comment(&self, request: &CmsRequest) -> CommentPostOutcome;
}

/// Comment form state handed to the template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentForm {
	/// Page the comment attaches to (the canonical original translation)
	pub page: PageId,

	/// Submitted values, empty for an unbound form
	pub data: HashMap<String, Value>,

	/// Whether the form is bound to submitted data
	pub is_bound: bool,
}

impl CommentForm {
	/// Fresh unbound form for `page`
	pub fn for_page(page: &Page) -> Self {
		Self {
			page: page.id,
			data: HashMap::new(),
			is_bound: false,
		}
	}

	/// Form bound to `data`, used to re-render validation errors
	pub fn bound(page: &Page, data: HashMap<String, Value>) -> Self {
		Self {
			page: page.id,
			data,
			is_bound: true,
		}
	}
}

/// Fragment rendering boundary
pub trait FragmentRenderer: Send + Sync {
	/// First template from `candidates` this renderer knows about
	fn select_template(&self, candidates: &[String]) -> Option<String>;

	/// Render the named template with `context`
	fn render(&self, name: &str, context: &Value) -> CmsResult<String>;
}

/// [`FragmentRenderer`] backed by a [`tera::Tera`] instance
pub struct TeraFragments {
	tera: tera::Tera,
}

impl TeraFragments {
	/// Empty renderer; templates are added with
	/// [`add_template`](TeraFragments::add_template)
	pub fn new() -> Self {
		Self {
			tera: tera::Tera::default(),
		}
	}

	/// Register a template source under `name`
	pub fn add_template(&mut self, name: &str, source: &str) -> CmsResult<()> {
		self.tera
			.add_raw_template(name, source)
			.map_err(|err| CmsError::Template(err.to_string()))
	}
}

impl Default for TeraFragments {
	fn default() -> Self {
		Self::new()
	}
}

impl FragmentRenderer for TeraFragments {
	fn select_template(&self, candidates: &[String]) -> Option<String> {
		let known: HashSet<&str> = self.tera.get_template_names().collect();
		candidates
			.iter()
			.find(|candidate| known.contains(candidate.as_str()))
			.cloned()
	}

	fn render(&self, name: &str, context: &Value) -> CmsResult<String> {
		let context = tera::Context::from_value(context.clone())
			.map_err(|err| CmsError::Template(err.to_string()))?;
		self.tera
			.render(name, &context)
			.map_err(|err| CmsError::Template(err.to_string()))
	}
}

/// Comments block attached to one page
#[derive(Debug, Clone, Serialize)]
pub struct CommentsContent {
	/// Owning page
	pub parent: PageId,

	/// New comments may be added
	pub comments_enabled: bool,
}

impl CommentsContent {
	/// Block for `parent` with comments enabled
	pub fn new(parent: PageId) -> Self {
		Self {
			parent,
			comments_enabled: true,
		}
	}

	/// Render the comment fragment for one request.
	///
	/// A POST whose first extra path segment is `post-comment` is forwarded
	/// to the backend while comments are enabled: a redirect outcome falls
	/// through to a fresh empty form, an invalid outcome re-renders a form
	/// bound to the submitted data. Everything else renders an unbound form.
	///
	/// Templates are tried in order
	/// `content/comments/<type>.html`, `content/comments/default-site.html`,
	/// `content/comments/default.html`; the first registered one wins.
	pub async fn render(
		&self,
		request: &CmsRequest,
		repo: &dyn PageRepository,
		backend: &dyn CommentBackend,
		renderer: &dyn FragmentRenderer,
	) -> CmsResult<String> {
		let page = repo
			.get(self.parent)
			.ok_or_else(|| CmsError::PageNotFound(self.parent.to_string()))?;
		let comment_page = original_translation(&page, repo);

		let mut form = None;
		if self.comments_enabled
			&& request.is_post()
			&& request.extra_path.first().map(String::as_str) == Some(POST_COMMENT_SEGMENT)
		{
			match backend.post_comment(request).await {
				CommentPostOutcome::Redirect(_) => {}
				CommentPostOutcome::Invalid(_) => {
					form = Some(CommentForm::bound(&comment_page, request.post.clone()));
				}
			}
		}
		let form = form.unwrap_or_else(|| CommentForm::for_page(&comment_page));

		let candidates = [
			format!("content/comments/{}.html", page.type_name()),
			"content/comments/default-site.html".to_string(),
			"content/comments/default.html".to_string(),
		];
		let name = renderer
			.select_template(&candidates)
			.ok_or_else(|| CmsError::TemplateNotFound(candidates.join(", ")))?;

		let context = json!({
			"content": self,
			"page": page,
			"parent": comment_page,
			"form": form,
		});
		renderer.render(&name, &context)
	}
}
