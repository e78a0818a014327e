//! Tracking of technology vintages across periods.
//!
//! Technology instances are owned by their subsector in a list per period. The registry groups
//! them by technology name into [`TechnologyType`]s, which refer to instances by their position in
//! those lists rather than owning them.
use crate::id::{SubsectorID, TechnologyID};
use crate::period::Period;
use crate::technology::{Technology, TechnologyConfig, VintageStatus};
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;

/// The location of a vintage in its subsector's per-period technology lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VintageKey {
    /// The period in which the vintage was built
    pub period: Period,
    /// The position of the vintage in that period's technology list
    pub index: usize,
}

/// All the vintages of one technology
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyType {
    id: TechnologyID,
    vintages: Vec<VintageKey>,
}

impl TechnologyType {
    /// Create a technology type with no vintages
    pub fn new(id: TechnologyID) -> Self {
        Self {
            id,
            vintages: Vec::new(),
        }
    }

    /// The technology's name
    pub fn id(&self) -> &TechnologyID {
        &self.id
    }

    /// Vintages in order of build period
    pub fn vintages(&self) -> &[VintageKey] {
        &self.vintages
    }

    /// The vintage built in `period`, if any
    pub fn vintage_built_in(&self, period: Period) -> Option<VintageKey> {
        self.vintages.iter().copied().find(|key| key.period == period)
    }

    /// Add a vintage, which must be built later than every existing vintage
    pub fn add_vintage(&mut self, key: VintageKey) -> Result<()> {
        if let Some(last) = self.vintages.last() {
            ensure!(
                key.period > last.period,
                "A vintage of {} built in period {} cannot follow one built in period {}",
                self.id,
                key.period,
                last.period
            );
        }
        self.vintages.push(key);

        Ok(())
    }
}

/// Groups a subsector's technology instances by name across periods
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VintageRegistry {
    types: IndexMap<TechnologyID, TechnologyType>,
}

impl VintageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a technology type for every configured technology.
    ///
    /// At least one technology is required unless the subsector is allowed to be empty, and names
    /// must be unique.
    pub fn initialize_tech_vector(
        &mut self,
        subsector: &SubsectorID,
        technologies: &[TechnologyConfig],
        allow_empty: bool,
    ) -> Result<()> {
        ensure!(
            allow_empty || !technologies.is_empty(),
            "Subsector {subsector} has no technologies"
        );
        if let Some(id) = technologies.iter().map(|tech| &tech.id).duplicates().next() {
            bail!("Technology {id} is defined more than once in subsector {subsector}");
        }

        for tech in technologies {
            self.types
                .entry(tech.id.clone())
                .or_insert_with(|| TechnologyType::new(tech.id.clone()));
        }

        Ok(())
    }

    /// Record the vintages built in `period`, found among the new technologies in `techs`
    pub fn register_period(&mut self, period: Period, techs: &[Technology]) -> Result<()> {
        let new_vintages = techs
            .iter()
            .enumerate()
            .filter(|(_, tech)| tech.status == VintageStatus::New)
            .sorted_by(|(_, a), (_, b)| a.id.cmp(&b.id))
            .chunk_by(|(_, tech)| tech.id.clone());

        for (id, mut group) in &new_vintages {
            let Some((index, _)) = group.next() else {
                continue;
            };
            ensure!(
                group.next().is_none(),
                "More than one new vintage of {id} was built in period {period}"
            );

            self.types
                .entry(id.clone())
                .or_insert_with(|| TechnologyType::new(id))
                .add_vintage(VintageKey { period, index })?;
        }

        Ok(())
    }

    /// Resolve a technology name to the canonical ID the registry is keyed by
    pub fn find_tech_name(&self, name: &str) -> Option<&TechnologyID> {
        self.types.get_key_value(name).map(|(id, _)| id)
    }

    /// Look up a technology type by name
    pub fn get(&self, name: &str) -> Option<&TechnologyType> {
        self.types.get(name)
    }

    /// Iterate over technology types in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = &TechnologyType> {
        self.types.values()
    }

    /// The number of technology types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether there are no technology types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
