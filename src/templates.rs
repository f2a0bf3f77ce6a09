//! Builtin plan templates
//!
//! Ready-made presets for common outdoor plans. Each template bundles a
//! condition spec with the criticality policy that fits the plan type: the
//! same criterion carries different weight depending on what is planned
//! (rain ruins a wedding outright; for a trail run it is a nuisance).

use serde::Serialize;

use crate::evaluator::{BoundedRange, ConditionSpec, Criterion, CriticalityPolicy};
use crate::plans::PlanKind;

/// A ready-made plan preset, referenced by slug at plan creation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanTemplate {
    pub slug: &'static str,
    pub name: &'static str,
    pub kind: PlanKind,
    /// One-line summary of the preset conditions
    pub summary: &'static str,
    pub spec: ConditionSpec,
    pub policy: CriticalityPolicy,
}

/// The builtin template catalog.
pub fn catalog() -> Vec<PlanTemplate> {
    vec![
        PlanTemplate {
            slug: "kitesurf",
            name: "Kitesurf / Windsurf",
            kind: PlanKind::Sport,
            summary: "Wind 15-30 km/h, no rain",
            spec: ConditionSpec {
                wind: Some(BoundedRange::between(15.0, 30.0)),
                no_rain: true,
                no_storms: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default().critical(Criterion::Wind),
        },
        PlanTemplate {
            slug: "wedding",
            name: "Outdoor Wedding",
            kind: PlanKind::Wedding,
            summary: "No rain, 20-30°C",
            spec: ConditionSpec {
                temperature: Some(BoundedRange::between(20.0, 30.0)),
                no_rain: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default().critical(Criterion::NoRain),
        },
        PlanTemplate {
            slug: "barbecue",
            name: "Barbecue",
            kind: PlanKind::Other,
            summary: "No rain, sunny",
            spec: ConditionSpec {
                no_rain: true,
                sunny: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "photography",
            name: "Photo Session",
            kind: PlanKind::Photography,
            summary: "Soft overcast light, no rain",
            spec: ConditionSpec {
                cloudy: true,
                no_rain: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "marathon",
            name: "Run / Marathon",
            kind: PlanKind::Sport,
            summary: "15-25°C, no rain",
            spec: ConditionSpec {
                temperature: Some(BoundedRange::between(15.0, 25.0)),
                no_rain: true,
                ..ConditionSpec::default()
            },
            // Heat is the dominant risk for endurance events
            policy: CriticalityPolicy::safety_default().critical(Criterion::Temperature),
        },
        PlanTemplate {
            slug: "festival",
            name: "Festival / Show",
            kind: PlanKind::Festival,
            summary: "No rain, moderate temperature",
            spec: ConditionSpec {
                temperature: Some(BoundedRange::between(18.0, 32.0)),
                no_rain: true,
                no_storms: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "picnic",
            name: "Picnic",
            kind: PlanKind::Other,
            summary: "Sunny, no strong wind",
            spec: ConditionSpec {
                sunny: true,
                no_strong_wind: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "paragliding",
            name: "Paragliding",
            kind: PlanKind::Sport,
            summary: "Wind 10-20 km/h, good visibility",
            spec: ConditionSpec {
                wind: Some(BoundedRange::between(10.0, 20.0)),
                visibility: Some(BoundedRange::at_least(10.0)),
                no_storms: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default()
                .critical(Criterion::Wind)
                .critical(Criterion::Visibility),
        },
        PlanTemplate {
            slug: "fishing",
            name: "Sport Fishing",
            kind: PlanKind::Other,
            summary: "Overcast, light wind",
            spec: ConditionSpec {
                wind: Some(BoundedRange::at_most(15.0)),
                cloudy: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "water-park",
            name: "Water Park",
            kind: PlanKind::Other,
            summary: "Sunny, 25-35°C",
            spec: ConditionSpec {
                temperature: Some(BoundedRange::between(25.0, 35.0)),
                sunny: true,
                no_storms: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "camping",
            name: "Trail / Camping",
            kind: PlanKind::Sport,
            summary: "No rain, 10-28°C",
            spec: ConditionSpec {
                temperature: Some(BoundedRange::between(10.0, 28.0)),
                no_rain: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
        PlanTemplate {
            slug: "corporate",
            name: "Corporate Event",
            kind: PlanKind::Other,
            summary: "No rain, comfortable feels-like",
            spec: ConditionSpec {
                feels_like: Some(BoundedRange::between(18.0, 28.0)),
                no_rain: true,
                ..ConditionSpec::default()
            },
            policy: CriticalityPolicy::safety_default(),
        },
    ]
}

/// Look up a template by slug.
pub fn find(slug: &str) -> Option<PlanTemplate> {
    catalog().into_iter().find(|t| t.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{ConditionEvaluator, Criticality, Verdict};
    use crate::models::WeatherReading;

    #[test]
    fn test_catalog_is_complete() {
        let templates = catalog();
        assert_eq!(templates.len(), 12);

        let mut slugs: Vec<&str> = templates.iter().map(|t| t.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), 12, "slugs must be unique");
    }

    #[test]
    fn test_every_preset_spec_is_valid() {
        for template in catalog() {
            assert!(
                template.spec.validate().is_ok(),
                "template {} has an invalid spec",
                template.slug
            );
        }
    }

    #[test]
    fn test_find_by_slug() {
        assert!(find("kitesurf").is_some());
        assert!(find("wedding").is_some());
        assert!(find("indoor-chess").is_none());
    }

    #[test]
    fn test_wedding_weights_rain_critical() {
        let wedding = find("wedding").unwrap();
        assert_eq!(wedding.policy.classify(Criterion::NoRain), Criticality::Critical);

        let kitesurf = find("kitesurf").unwrap();
        assert_eq!(kitesurf.policy.classify(Criterion::Wind), Criticality::Critical);
        assert_eq!(kitesurf.policy.classify(Criterion::NoRain), Criticality::Soft);
    }

    #[test]
    fn test_kitesurf_preset_end_to_end() {
        let template = find("kitesurf").unwrap();
        let reading = WeatherReading {
            wind_speed: Some(22.0),
            rain_chance: Some(5.0),
            storm: Some(false),
            ..WeatherReading::empty()
        };

        let eval = ConditionEvaluator::default()
            .evaluate(&template.spec, &reading, &template.policy)
            .unwrap();
        assert_eq!(eval.verdict, Verdict::Ideal);

        let becalmed = WeatherReading {
            wind_speed: Some(3.0),
            rain_chance: Some(5.0),
            storm: Some(false),
            ..WeatherReading::empty()
        };
        let eval = ConditionEvaluator::default()
            .evaluate(&template.spec, &becalmed, &template.policy)
            .unwrap();
        assert_eq!(eval.verdict, Verdict::Alert, "dead calm is unflyable");
    }
}
