//! Built-in models. Each one is only a formula set and a rate table; they
//! all run on the same engine.

use crate::{
    error::{SimError, SimResult},
    model::{Model, ModelBuilder},
    rates::RateParameters,
    types::{Quantity, Year},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const INFECTION_RATE: &str = "infection_rate";
pub const RECOVERY_RATE: &str = "recovery_rate";
pub const ZOMBIE_RATE: &str = "zombie_rate";
pub const DEATH_RATE: &str = "death_rate";
pub const ZOMBIE_DEATH_RATE: &str = "zombie_death_rate";
pub const HUMAN_BIRTH_RATE: &str = "human_birth_rate";
pub const QUEEN_BIRTH_RATE: &str = "queen_birth_rate";
pub const SILPHALET_BIRTH_RATE: &str = "silphalet_birth_rate";

/// Births per 1000 per year, spread over twelve monthly steps.
const BIRTH_DIVISOR: f64 = 1000.0 * 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Mass-action SIR: new infections are `β·S·I/N`.
    Sir,
    /// Linear SIR variant: new infections are `β·S`, losses from S are `β·I`.
    Influenza,
    Sqeir,
    /// Susceptible, Immune, Infected, Zombies, Dead.
    Zombie,
    /// Population growth: Humans, Carriers, Queens, Silphalets.
    Diclonius,
}

/// Starting point for a built-in model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefaults {
    pub start_year: Year,
    pub end_year:   Year,
    pub initial:    BTreeMap<String, Quantity>,
    pub rates:      RateParameters,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Sir,
        ModelKind::Influenza,
        ModelKind::Sqeir,
        ModelKind::Zombie,
        ModelKind::Diclonius,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sir       => "sir",
            Self::Influenza => "influenza",
            Self::Sqeir     => "sqeir",
            Self::Zombie    => "zombie",
            Self::Diclonius => "diclonius",
        }
    }

    pub fn build(self) -> SimResult<Model> {
        match self {
            Self::Sir       => sir(),
            Self::Influenza => influenza(),
            Self::Sqeir     => sqeir(),
            Self::Zombie    => zombie(),
            Self::Diclonius => diclonius(),
        }
    }

    pub fn defaults(self) -> SimResult<ModelDefaults> {
        let (start_year, end_year, initial, rates): (Year, Year, Vec<(&str, f64)>, Vec<(&str, f64)>) =
            match self {
                Self::Sir | Self::Influenza => (
                    2023,
                    2024,
                    vec![("Susceptible", 175_000.0), ("Infected", 10.0), ("Recovered", 0.0)],
                    vec![(INFECTION_RATE, 0.4), (RECOVERY_RATE, 0.04)],
                ),
                Self::Sqeir => (
                    2023,
                    2025,
                    vec![
                        ("Susceptible", 175_000.0),
                        ("Quarantined", 0.0),
                        ("Exposed", 100.0),
                        ("Infected", 10.0),
                        ("Recovered", 0.0),
                    ],
                    vec![(INFECTION_RATE, 0.4), (RECOVERY_RATE, 0.04)],
                ),
                Self::Zombie => (
                    2023,
                    2029,
                    vec![
                        ("Susceptible", 175_000.0),
                        ("Immune", 100.0),
                        ("Infected", 10.0),
                        ("Zombies", 10.0),
                        ("Dead", 0.0),
                    ],
                    vec![
                        (INFECTION_RATE, 0.4),
                        (ZOMBIE_RATE, 0.04),
                        (DEATH_RATE, 0.25),
                        (ZOMBIE_DEATH_RATE, 0.5),
                    ],
                ),
                Self::Diclonius => (
                    2005,
                    2025,
                    vec![
                        ("Humans", 173_000.0),
                        ("Carriers", 10.0),
                        ("Queens", 1.0),
                        ("Silphalets", 35.0),
                    ],
                    vec![
                        (INFECTION_RATE, 0.4),
                        (HUMAN_BIRTH_RATE, 7.013),
                        (QUEEN_BIRTH_RATE, 7.013),
                        (SILPHALET_BIRTH_RATE, 7.013),
                    ],
                ),
            };

        let mut params = RateParameters::new();
        for (name, value) in rates {
            params.set(name, value)?;
        }
        Ok(ModelDefaults {
            start_year,
            end_year,
            initial: initial.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            rates: params,
        })
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| SimError::UnknownModel(s.to_string()))
    }
}

fn sir() -> SimResult<Model> {
    let mut b = ModelBuilder::new("sir");
    let s = b.compartment("Susceptible");
    let i = b.compartment("Infected");
    let r = b.compartment("Recovered");
    let beta = b.rate(INFECTION_RATE);
    let gamma = b.rate(RECOVERY_RATE);

    b.rule(s, move |p, k| p[s] - k.flow(mass_action(p[s], p[i], p[r], k[beta])));
    b.rule(i, move |p, k| {
        p[i] + k.flow(mass_action(p[s], p[i], p[r], k[beta])) - k.flow(p[i] * k[gamma])
    });
    b.rule(r, move |p, k| p[r] + k.flow(p[i] * k[gamma]));
    b.build()
}

/// `β·S·I/N`; no new infections in an empty population.
fn mass_action(s: Quantity, i: Quantity, r: Quantity, beta: f64) -> Quantity {
    let n = s + i + r;
    if n > 0.0 { beta * s * i / n } else { 0.0 }
}

fn influenza() -> SimResult<Model> {
    let mut b = ModelBuilder::new("influenza");
    let s = b.compartment("Susceptible");
    let i = b.compartment("Infected");
    let r = b.compartment("Recovered");
    let beta = b.rate(INFECTION_RATE);
    let gamma = b.rate(RECOVERY_RATE);

    b.rule(s, move |p, k| p[s] - k.flow(p[i] * k[beta]));
    b.rule(i, move |p, k| p[i] + k.flow(p[s] * k[beta]) - k.flow(p[i] * k[gamma]));
    b.rule(r, move |p, k| p[r] + k.flow(p[i] * k[gamma]));
    b.build()
}

fn sqeir() -> SimResult<Model> {
    let mut b = ModelBuilder::new("sqeir");
    let s = b.compartment("Susceptible");
    let q = b.compartment("Quarantined");
    let e = b.compartment("Exposed");
    let i = b.compartment("Infected");
    let r = b.compartment("Recovered");
    let beta = b.rate(INFECTION_RATE);
    let gamma = b.rate(RECOVERY_RATE);

    b.rule(s, move |p, k| p[s] - k.flow(p[s] * k[beta]));
    b.rule(q, move |p, k| p[q] - k.flow(p[q] * k[beta]));
    b.rule(e, move |p, k| p[e] - k.flow(p[e] * k[beta]));
    b.rule(i, move |p, k| p[i] + k.flow(p[s] * k[beta]) - k.flow(p[i] * k[gamma]));
    b.rule(r, move |p, k| p[r] + k.flow(p[i] * k[gamma]));
    b.build()
}

fn zombie() -> SimResult<Model> {
    let mut b = ModelBuilder::new("zombie");
    let s = b.compartment("Susceptible");
    let im = b.compartment("Immune");
    let inf = b.compartment("Infected");
    let z = b.compartment("Zombies");
    let d = b.compartment("Dead");
    let beta = b.rate(INFECTION_RATE);
    let zeta = b.rate(ZOMBIE_RATE);
    let delta = b.rate(DEATH_RATE);
    let alpha = b.rate(ZOMBIE_DEATH_RATE);

    b.rule(s, move |p, k| p[s] - k.flow(p[s] * (k[beta] + k[delta])));
    b.rule(im, move |p, k| p[im] - k.flow(p[im] * k[delta]));
    b.rule(inf, move |p, k| {
        p[inf] + k.flow(p[s] * k[beta]) - k.flow(p[inf] * (k[zeta] + k[delta]))
    });
    b.rule(z, move |p, k| p[z] + k.flow(p[inf] * k[zeta]) - k.flow(p[z] * k[alpha]));
    b.rule(d, move |p, k| {
        p[d] + k.flow(p[s] * k[delta])
            + k.flow(p[inf] * k[delta])
            + k.flow(p[im] * k[delta])
            + k.flow(p[z] * k[alpha])
    });
    b.build()
}

fn diclonius() -> SimResult<Model> {
    let mut b = ModelBuilder::new("diclonius");
    let h = b.compartment("Humans");
    let c = b.compartment("Carriers");
    let q = b.compartment("Queens");
    let sp = b.compartment("Silphalets");
    let beta = b.rate(INFECTION_RATE);
    let birth_h = b.rate(HUMAN_BIRTH_RATE);
    let birth_q = b.rate(QUEEN_BIRTH_RATE);
    let birth_s = b.rate(SILPHALET_BIRTH_RATE);

    b.rule(h, move |p, k| {
        p[h] + k.flow(p[h] * k[birth_h] / BIRTH_DIVISOR) - k.flow((p[q] + p[sp]) * k[beta])
    });
    b.rule(c, move |p, k| p[c] + k.flow((p[q] + p[sp]) * k[beta]));
    b.rule(q, move |p, k| {
        p[q] + k.flow((p[q] + p[h] / 2.0 + p[c] / 2.0) * k[birth_q] / BIRTH_DIVISOR)
    });
    b.rule(sp, move |p, k| p[sp] + k.flow((p[h] + p[c]) * k[birth_s] / BIRTH_DIVISOR));
    b.build()
}
