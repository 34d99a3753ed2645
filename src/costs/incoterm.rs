//! Incoterms 2020 trade terms and the responsibility split they imply.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::CustomsError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Incoterm {
    Exw,
    Fca,
    Fas,
    #[default]
    Fob,
    Cfr,
    Cif,
    Cpt,
    Cip,
    Dap,
    Dpu,
    Ddp,
}

impl Incoterm {
    pub const ALL: [Incoterm; 11] = [
        Incoterm::Exw,
        Incoterm::Fca,
        Incoterm::Fas,
        Incoterm::Fob,
        Incoterm::Cfr,
        Incoterm::Cif,
        Incoterm::Cpt,
        Incoterm::Cip,
        Incoterm::Dap,
        Incoterm::Dpu,
        Incoterm::Ddp,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Incoterm::Exw => "EXW",
            Incoterm::Fca => "FCA",
            Incoterm::Fas => "FAS",
            Incoterm::Fob => "FOB",
            Incoterm::Cfr => "CFR",
            Incoterm::Cif => "CIF",
            Incoterm::Cpt => "CPT",
            Incoterm::Cip => "CIP",
            Incoterm::Dap => "DAP",
            Incoterm::Dpu => "DPU",
            Incoterm::Ddp => "DDP",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Incoterm::Exw => "Ex Works",
            Incoterm::Fca => "Free Carrier",
            Incoterm::Fas => "Free Alongside Ship",
            Incoterm::Fob => "Free On Board",
            Incoterm::Cfr => "Cost and Freight",
            Incoterm::Cif => "Cost, Insurance and Freight",
            Incoterm::Cpt => "Carriage Paid To",
            Incoterm::Cip => "Carriage And Insurance Paid To",
            Incoterm::Dap => "Delivered At Place",
            Incoterm::Dpu => "Delivered at Place Unloaded",
            Incoterm::Ddp => "Delivered Duty Paid",
        }
    }

    pub fn seller_responsibility(self) -> &'static str {
        match self {
            Incoterm::Exw => "Goods made ready at the seller's premises",
            Incoterm::Fca => "Goods made ready and handed to the buyer's carrier",
            Incoterm::Fas => "Goods delivered alongside the vessel at the port of shipment",
            Incoterm::Fob => "Goods delivered and loaded on board at the port of shipment",
            Incoterm::Cfr => "Loading on board plus ocean freight to the destination port",
            Incoterm::Cif => {
                "Loading on board, ocean freight to the destination port and marine insurance"
            }
            Incoterm::Cpt => "Carriage paid to the named destination",
            Incoterm::Cip => "Carriage and insurance paid to the named destination",
            Incoterm::Dap => "Delivery to the named destination, ready for unloading",
            Incoterm::Dpu => "Delivery to the named destination, unloaded",
            Incoterm::Ddp => "Delivery to the named destination with duties and taxes paid",
        }
    }

    pub fn buyer_responsibility(self) -> &'static str {
        match self {
            Incoterm::Exw => "All carriage, insurance, duties and taxes from the seller's premises",
            Incoterm::Fca => "Main carriage from the named carrier onward, insurance, duties and taxes",
            Incoterm::Fas => "Loading, ocean freight, onward carriage, duties and taxes",
            Incoterm::Fob => "Ocean freight from on board, onward carriage, duties and taxes",
            Incoterm::Cfr | Incoterm::Cif => {
                "Unloading at the destination port, onward carriage, duties and taxes"
            }
            Incoterm::Cpt | Incoterm::Cip => "Unloading at the named destination, duties and taxes",
            Incoterm::Dap => "Unloading at the destination, duties and taxes",
            Incoterm::Dpu => "Duties and taxes after unloading",
            Incoterm::Ddp => "Taking delivery at the destination",
        }
    }

    /// Whether import duties fall on the seller.
    pub fn seller_pays_duty(self) -> bool {
        matches!(self, Incoterm::Ddp)
    }
}

impl fmt::Display for Incoterm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.title())
    }
}

impl FromStr for Incoterm {
    type Err = CustomsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Incoterm::ALL
            .into_iter()
            .find(|term| term.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CustomsError::InvalidInput(format!("unknown incoterm `{}`", value)))
    }
}
