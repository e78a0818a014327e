//! Traversal of subsector and technology state for reporting.
//!
//! Reporting code implements [`Visitor`] and is walked over a subsector with
//! [`Subsector::accept`](crate::subsector::Subsector::accept), so that the engine does not depend
//! on any output format.
use crate::id::{RegionID, SectorID, SubsectorID, TechnologyID};
use crate::period::Period;
use crate::subsector::Subsector;
use crate::technology::{Technology, VintageStatus};
use crate::units::{Energy, Money, MoneyPerEnergy};
use log::info;

/// Receives subsector and technology state during a traversal
pub trait Visitor {
    /// Called before a subsector's technologies are visited
    fn start_visit_subsector(&mut self, _subsector: &Subsector, _period: Period) {}

    /// Called for each technology of the subsector in the period
    fn visit_technology(
        &mut self,
        _subsector: &Subsector,
        _technology: &Technology,
        _period: Period,
    ) {
    }

    /// Called after a subsector's technologies have been visited
    fn end_visit_subsector(&mut self, _subsector: &Subsector, _period: Period) {}
}

/// One subsector's results for a period
#[derive(Debug, Clone, PartialEq)]
pub struct SubsectorRow {
    /// The region
    pub region: RegionID,
    /// The sector
    pub sector: SectorID,
    /// The subsector
    pub subsector: SubsectorID,
    /// Cost index of the subsector
    pub cost: MoneyPerEnergy,
    /// Effective share weight
    pub share_weight: f64,
    /// Total output
    pub output: Energy,
    /// Investment placed
    pub investment: Money,
}

/// One technology vintage's results for a period
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyRow {
    /// The subsector
    pub subsector: SubsectorID,
    /// The technology
    pub technology: TechnologyID,
    /// The year the vintage was built
    pub build_year: u32,
    /// New or existing
    pub status: VintageStatus,
    /// Output
    pub output: Energy,
    /// Share weight
    pub share_weight: f64,
}

/// Collects a flat summary of everything visited
#[derive(Debug, Default)]
pub struct SummaryCollector {
    /// Rows for subsectors, in visiting order
    pub subsectors: Vec<SubsectorRow>,
    /// Rows for technologies, in visiting order
    pub technologies: Vec<TechnologyRow>,
}

impl Visitor for SummaryCollector {
    fn visit_technology(
        &mut self,
        subsector: &Subsector,
        technology: &Technology,
        _period: Period,
    ) {
        self.technologies.push(TechnologyRow {
            subsector: subsector.name().clone(),
            technology: technology.id.clone(),
            build_year: technology.build_year,
            status: technology.status,
            output: technology.output(),
            share_weight: technology.share_weight,
        });
    }

    fn end_visit_subsector(&mut self, subsector: &Subsector, period: Period) {
        self.subsectors.push(SubsectorRow {
            region: subsector.region().clone(),
            sector: subsector.sector().clone(),
            subsector: subsector.name().clone(),
            cost: subsector.price(period),
            share_weight: subsector.share_weight(period),
            output: subsector.output(period),
            investment: subsector.annual_investment(period),
        });
    }
}

impl SummaryCollector {
    /// Write the collected rows to the log
    pub fn log(&self, year: u32) {
        for row in &self.subsectors {
            info!(
                "{year} {}/{}/{}: output {:.3}, cost {:.3}, share weight {:.4}, investment {:.3}",
                row.region,
                row.sector,
                row.subsector,
                row.output.value(),
                row.cost.value(),
                row.share_weight,
                row.investment.value()
            );
        }
        for row in &self.technologies {
            info!(
                "{year} {}/{} ({} vintage of {}): output {:.3}, share weight {:.4}",
                row.subsector,
                row.technology,
                row.status,
                row.build_year,
                row.output.value(),
                row.share_weight
            );
        }
    }
}
