#![forbid(unsafe_code)]

//! Trigger device for exercising nested SMMU translation end to end.
//!
//! The device exposes a single 32-bit control register. Writing it builds one
//! complete translation scenario — stream table entry, context descriptor and
//! every page-table entry across both stages, including the stage-2 mappings
//! of the stage-1 tables' own addresses — persists it into secure RAM through
//! the [`fixture::PhysFixture`], then issues a 4-byte write and read at the
//! test input address through the translated DMA address space. Preparatory
//! failures never abort a run; the final read-back is the pass/fail signal.
//!
//! The translation unit itself is an external collaborator reached through
//! the injected DMA [`smmu_mem::AddressSpace`]; this crate only produces the
//! configuration it consumes.

pub mod device;
pub mod fixture;
pub mod scenario;

pub use device::{MmioHandler, SmmuTestDevice, REGION_SIZE, REG_CON};
pub use fixture::{PhysFixture, TraceEvent, TraceOp};
pub use scenario::{Scenario, ScenarioKind, ScenarioReport, TableWrite};
