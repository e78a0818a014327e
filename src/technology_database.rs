//! The global technology database holds technology templates shared between subsectors.
//!
//! It is constructed once at start up and is read-only thereafter, so it can be shared by
//! subsectors evaluated on different threads.
use crate::id::{TechnologyID, get_by_id};
use crate::technology::TechnologyTemplate;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use log::debug;
use std::sync::OnceLock;

/// The process-wide technology database
static GLOBAL_TECHNOLOGY_DATABASE: OnceLock<GlobalTechnologyDatabase> = OnceLock::new();

/// A read-only lookup of technology templates by name
#[derive(Debug, Default, PartialEq)]
pub struct GlobalTechnologyDatabase {
    templates: IndexMap<TechnologyID, TechnologyTemplate>,
}

impl GlobalTechnologyDatabase {
    /// Create a database from templates, checking that names are unique
    pub fn new<I>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = TechnologyTemplate>,
    {
        let mut map = IndexMap::new();
        for template in templates {
            let id = template.id.clone();
            ensure!(
                map.insert(id.clone(), template).is_none(),
                "Duplicate technology template: {id}"
            );
        }

        Ok(Self { templates: map })
    }

    /// Install `database` as the process-wide technology database.
    ///
    /// This can only be done once.
    pub fn install(database: Self) -> Result<&'static Self> {
        if GLOBAL_TECHNOLOGY_DATABASE.set(database).is_err() {
            bail!("The global technology database has already been installed");
        }
        debug!("Installed global technology database");

        Self::global().context("The global technology database could not be installed")
    }

    /// The process-wide technology database, if it has been installed
    pub fn global() -> Option<&'static Self> {
        GLOBAL_TECHNOLOGY_DATABASE.get()
    }

    /// Look up a template by name
    pub fn get_template(&self, id: &str) -> Result<&TechnologyTemplate> {
        get_by_id(&self.templates, id)
    }

    /// Iterate over all templates
    pub fn iter(&self) -> impl Iterator<Item = &TechnologyTemplate> {
        self.templates.values()
    }

    /// The number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the database contains no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
