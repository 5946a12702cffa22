//! mock-zos: emulation of the RACF PassTicket services (`IRRPassTicket`) for
//! environments without a SAF security product.
pub mod error;
pub mod passticket;

pub use error::{ErrorCode, EvaluationError, GenerationError};
pub use passticket::{IrrPassTicket, PassTicketService, UserApp};
