use strucmotif::core::graph::policy::InclusionPolicy;
use strucmotif::core::models::residue::ResidueType;
use strucmotif::core::models::selector::LabelSelector;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid exchange '{0}'. Expected 'CHAIN:SEQ=TYPE,TYPE' (e.g., 'A:57=HIS,TYR').")]
    InvalidExchangeFormat(String),

    #[error("Invalid residue selector '{0}'. Expected 'CHAIN:SEQ' (e.g., 'A:57').")]
    InvalidSelector(String),

    #[error("Unknown residue type '{0}'. Expected a three-letter code such as 'HIS'.")]
    UnknownResidueType(String),

    #[error(
        "Invalid inclusion policy '{0}'. \
         Expected 'deposited', 'deposited-with-contacts' or 'assembly:<ID>'."
    )]
    InvalidPolicy(String),
}

/// Parses a selector whose residue may be exchanged, e.g. `A:57=HIS,TYR`.
pub fn parse_exchange(value: &str) -> Result<(LabelSelector, Vec<ResidueType>), ParseError> {
    let (selector, types) = value
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidExchangeFormat(value.to_string()))?;
    let selector = selector
        .trim()
        .parse::<LabelSelector>()
        .map_err(|_| ParseError::InvalidSelector(selector.trim().to_string()))?;
    let types = parse_residue_types(types.split(','))?;
    if types.is_empty() {
        return Err(ParseError::InvalidExchangeFormat(value.to_string()));
    }
    Ok((selector, types))
}

pub fn parse_residue_types<'a, I>(codes: I) -> Result<Vec<ResidueType>, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<ResidueType>()
                .map_err(|_| ParseError::UnknownResidueType(code.to_string()))
        })
        .collect()
}

pub fn parse_policy(value: &str) -> Result<InclusionPolicy, ParseError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "deposited" => Ok(InclusionPolicy::Deposited),
        "deposited-with-contacts" => Ok(InclusionPolicy::DepositedWithContacts),
        _ => match value.trim().split_once(':') {
            Some((kind, id)) if kind.eq_ignore_ascii_case("assembly") && !id.trim().is_empty() => {
                Ok(InclusionPolicy::Assembly(id.trim().to_string()))
            }
            _ => Err(ParseError::InvalidPolicy(value.to_string())),
        },
    }
}
