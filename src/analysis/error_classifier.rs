use log::warn;

use crate::output_normalization::envelope::{ErrorClassification, ResultEnvelope};

/// Closed set of packet error classes that map to tshark display filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    All,
    Malformed,
    Tcp,
    Retransmission,
    DuplicateAck,
    LostSegment,
}

/// Outcome of resolving a caller-supplied category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category: ErrorCategory,
    /// The requested name was unknown and `All` was substituted.
    pub fell_back: bool,
}

impl ErrorCategory {
    pub const VARIANTS: [ErrorCategory; 6] = [
        ErrorCategory::All,
        ErrorCategory::Malformed,
        ErrorCategory::Tcp,
        ErrorCategory::Retransmission,
        ErrorCategory::DuplicateAck,
        ErrorCategory::LostSegment,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::VARIANTS.into_iter().find(|c| c.name() == name)
    }

    /// Unknown names resolve to [`ErrorCategory::All`].
    pub fn resolve(name: &str) -> ResolvedCategory {
        match Self::from_name(name) {
            Some(category) => ResolvedCategory {
                category,
                fell_back: false,
            },
            None => {
                warn!("Unknown error category '{}', falling back to 'all'", name);
                ResolvedCategory {
                    category: ErrorCategory::All,
                    fell_back: true,
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::All => "all",
            ErrorCategory::Malformed => "malformed",
            ErrorCategory::Tcp => "tcp",
            ErrorCategory::Retransmission => "retransmission",
            ErrorCategory::DuplicateAck => "duplicate_ack",
            ErrorCategory::LostSegment => "lost_segment",
        }
    }

    pub fn filter_expression(&self) -> &'static str {
        match self {
            ErrorCategory::All => {
                "(_ws.malformed) or (tcp.analysis.flags) or (tcp.analysis.retransmission) or (tcp.analysis.duplicate_ack) or (tcp.analysis.lost_segment)"
            }
            ErrorCategory::Malformed => "_ws.malformed",
            ErrorCategory::Tcp => "tcp.analysis.flags",
            ErrorCategory::Retransmission => "tcp.analysis.retransmission",
            ErrorCategory::DuplicateAck => "tcp.analysis.duplicate_ack",
            ErrorCategory::LostSegment => "tcp.analysis.lost_segment",
        }
    }
}

/// Adds the error count, category and filter to a packet-array result.
/// Any other envelope is returned unchanged.
pub fn annotate(envelope: ResultEnvelope, category: ErrorCategory) -> ResultEnvelope {
    let total_error_packets = match envelope.packet_statistics() {
        Some(stats) => stats.total_packets,
        None => return envelope,
    };
    envelope.with_classification(ErrorClassification {
        total_error_packets,
        error_type: category.name().to_string(),
        filter_expression: category.filter_expression().to_string(),
    })
}
