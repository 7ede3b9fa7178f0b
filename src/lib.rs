//! # DNA Modules
//!
//! Реестр DNA-модулей и планировщик их установки.
//!
//! DNA-модуль генерирует boilerplate для конкретного фреймворка (Next.js,
//! Flutter, React Native, Tauri, SvelteKit, Electron). Эта библиотека решает,
//! можно ли поставить запрошенный набор модулей и в каком порядке.
//!
//! ## Основные модули
//!
//! - [`descriptor`] - Дескрипторы модулей
//! - [`registry`] - Реестр модулей
//! - [`compat`] - Проверка совместимости
//! - [`resolver`] - Топологическая сортировка
//! - [`planner`] - Построение плана установки
//! - [`installer`] - Генерация файлов по плану
//! - [`catalog`] - Загрузка каталога из TOML/JSON
//!
//! ## Пример
//!
//! ```rust
//! use dna_modules::{plan, Framework, InstallationRequest, ModuleDescriptor, ModuleRegistry, TemplateFactory};
//!
//! let mut registry = ModuleRegistry::new();
//! registry
//!     .register(ModuleDescriptor::new("user_analytics", "1.0.0").supports_all(), TemplateFactory::empty())
//!     .unwrap();
//! registry
//!     .register(
//!         ModuleDescriptor::new("business_intelligence", "1.0.0")
//!             .supports_all()
//!             .depends_on("user_analytics", Some("^1.0.0")),
//!         TemplateFactory::empty(),
//!     )
//!     .unwrap();
//!
//! let request = InstallationRequest::new(["business_intelligence"], Framework::Nextjs);
//! let plan = plan(&request, &registry).unwrap();
//! assert_eq!(plan.modules(), ["user_analytics", "business_intelligence"]);
//! ```

// === Ядро ===
pub mod compat;
pub mod descriptor;
pub mod error;
pub mod planner;
pub mod problem;
pub mod registry;
pub mod resolver;
pub mod version;

// === Генерация и конфигурация ===
pub mod catalog;
pub mod factory;
pub mod installer;

// === Re-exports для удобства ===
pub use catalog::Catalog;
pub use descriptor::{ConflictSpec, DependencySpec, Framework, ModuleDescriptor, Severity, SupportLevel};
pub use error::{DnaError, DnaResult};
pub use factory::{GeneratedFile, GenerationContext, ModuleFactory, TemplateFactory};
pub use installer::Installer;
pub use planner::{plan, plan_with_observer, InstallationRequest, Plan, PlanObserver, Rejection};
pub use problem::{Problem, ProblemCode};
pub use registry::ModuleRegistry;
