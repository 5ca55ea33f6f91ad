//! # Musette CMS
//!
//! Content-management building blocks for hierarchical page backends:
//! admin-form validation for tree-structured pages, and a pluggable
//! comments content block.
//!
//! ## Features
//!
//! - **Page Administration**: slug/URL uniqueness among active pages,
//!   parent/child attachment rules, prefill of new-page and translation
//!   forms, singleton-aware template choices
//! - **Comment Blocks**: a per-page comments block that handles posted
//!   comments through an external comment subsystem and renders its
//!   fragment via a cascading template lookup
//!
//! ## Architecture
//!
//! ```text
//! musette-cms
//! ├── pages     - Page records, repository boundary, translation lookup
//! ├── templates - Page template descriptors and registry
//! ├── admin     - Page admin form (validation + prefill), redirect widget
//! └── comments  - Comments content block, comment subsystem boundary
//! ```
//!
//! The web framework itself stays outside: persistence, comment posting and
//! fragment rendering are collaborator traits the host application implements.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use musette_cms::prelude::*;
//!
//! let mut form = PageAdminForm::new(submitted_data);
//! if form.clean(&repo, &registry) {
//!     // persist form.cleaned_data()
//! } else {
//!     // re-render with form.errors()
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

// Module declarations
pub mod admin;
pub mod comments;
pub mod pages;
pub mod templates;

// Prelude for convenient imports
pub mod prelude {
	//! Convenient re-exports of commonly used items

	// Pages
	pub use crate::pages::{InMemoryPageRepository, Page, PageId, PageRepository};

	// Templates
	pub use crate::templates::{PageTemplate, TemplateRegistry};

	// Admin
	pub use crate::admin::{ModelRegistry, PageAdminForm, RedirectToWidget};

	// Comments
	pub use crate::comments::{
		CmsRequest, CommentBackend, CommentForm, CommentPostOutcome, CommentsContent,
		FragmentRenderer, TeraFragments,
	};
}

/// CMS error types
pub mod error {
	use thiserror::Error;

	/// CMS-related errors
	#[derive(Error, Debug)]
	pub enum CmsError {
		/// Page not found
		#[error("Page not found: {0}")]
		PageNotFound(String),

		/// None of the candidate template names is registered
		#[error("No template found among candidates: {0}")]
		TemplateNotFound(String),

		/// Template registration or rendering failed
		#[error("Template error: {0}")]
		Template(String),
	}

	/// Result type for CMS operations
	pub type CmsResult<T> = Result<T, CmsError>;
}
