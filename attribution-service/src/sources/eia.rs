use std::collections::BTreeSet;

use grid_client::eia::{
    fetch_all, to_fuel_generation, to_interchange, to_region_series, EiaError, EiaQuery, EiaRow, EiaSettings,
    PageFetcher,
};
use time::Date;

use crate::attribution::AttributionInputs;

fn fetch_rows<F: PageFetcher>(fetcher: &mut F, query: &EiaQuery, page_size: usize) -> Result<Vec<EiaRow>, EiaError> {
    fetch_all(
        |q: &EiaQuery, offset: usize, length: usize| fetcher.fetch(q, offset, length),
        query,
        page_size,
    )
}

/// Fetches the grid tables needed to attribute `local_region` over `[start, end]`.
///
/// Region data and interchange are requested for the local region first; the
/// fuel mix is then requested for the local region plus every region that
/// sent it energy. Usage is left empty for the caller to fill in.
pub fn load_grid_inputs<F: PageFetcher>(
    settings: &EiaSettings,
    fetcher: &mut F,
    local_region: &str,
    start: Date,
    end: Date,
) -> Result<AttributionInputs, EiaError> {
    let page_size = settings.effective_page_size();
    let local = vec![local_region.to_string()];

    let region_series = to_region_series(&fetch_rows(
        fetcher,
        &EiaQuery::region_data(&local, start, end),
        page_size,
    )?)?;
    let interchange = to_interchange(&fetch_rows(
        fetcher,
        &EiaQuery::interchange(&local, start, end),
        page_size,
    )?)?;

    let mut regions: BTreeSet<&str> = interchange
        .iter()
        .filter(|r| r.to_region == local_region)
        .map(|r| r.from_region.as_str())
        .collect();
    regions.insert(local_region);
    let regions: Vec<String> = regions.into_iter().map(str::to_string).collect();

    let fuel_mix = to_fuel_generation(&fetch_rows(
        fetcher,
        &EiaQuery::fuel_mix(&regions, start, end),
        page_size,
    )?)?;

    tracing::info!(
        region = local_region,
        %start,
        %end,
        region_series = region_series.len(),
        interchange = interchange.len(),
        fuel_mix = fuel_mix.len(),
        source_regions = regions.len(),
        "grid inputs fetched"
    );

    Ok(AttributionInputs {
        region_series,
        interchange,
        fuel_mix,
        usage: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_client::eia::EiaRoute;
    use time::macros::date;

    fn settings() -> EiaSettings {
        EiaSettings {
            base_url: "https://api.eia.gov/v2".to_string(),
            api_key: "key".to_string(),
            page_size: 9000,
        }
    }

    fn page(rows: &[&str]) -> String {
        format!(r#"{{"response": {{"total": {}, "data": [{}]}}}}"#, rows.len(), rows.join(","))
    }

    #[test]
    fn fetches_fuel_mix_for_local_and_importing_regions() {
        let mut requests: Vec<(EiaRoute, Vec<String>, usize)> = Vec::new();
        let mut fetcher = |q: &EiaQuery, _offset: usize, length: usize| {
            let (facet, body) = match q.route {
                EiaRoute::RegionData => (
                    "respondent",
                    page(&[
                        r#"{"period": "2024-01-01T00", "respondent": "ISNE", "type": "D", "value": 100}"#,
                        r#"{"period": "2024-01-01T00", "respondent": "ISNE", "type": "NG", "value": "80"}"#,
                    ]),
                ),
                EiaRoute::Interchange => (
                    "toba",
                    page(&[
                        r#"{"period": "2024-01-01T00", "fromba": "NYIS", "toba": "ISNE", "value": 30}"#,
                        r#"{"period": "2024-01-01T00", "fromba": "HQT", "toba": "ISNE", "value": -5}"#,
                    ]),
                ),
                EiaRoute::FuelType => (
                    "respondent",
                    page(&[r#"{"period": "2024-01-01T00", "respondent": "ISNE", "fueltype": "NG", "value": 80}"#]),
                ),
            };
            requests.push((q.route, q.facets.get(facet).cloned().unwrap_or_default(), length));
            Ok::<_, EiaError>(body)
        };

        let inputs =
            load_grid_inputs(&settings(), &mut fetcher, "ISNE", date!(2024-01-01), date!(2024-01-02)).unwrap();
        assert_eq!(inputs.region_series.len(), 2);
        assert_eq!(inputs.interchange.len(), 2);
        assert_eq!(inputs.fuel_mix.len(), 1);
        assert!(inputs.usage.is_empty());

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].1, vec!["ISNE"]);
        assert_eq!(requests[1].1, vec!["ISNE"]);
        assert_eq!(requests[2].0, EiaRoute::FuelType);
        assert_eq!(requests[2].1, vec!["HQT", "ISNE", "NYIS"]);
        // Requested page size is clamped to what the API serves.
        assert!(requests.iter().all(|(_, _, length)| *length == 5000));
    }

    #[test]
    fn transport_errors_propagate() {
        let mut fetcher = |_: &EiaQuery, _: usize, _: usize| Err::<String, _>(EiaError::Transport("timeout".into()));
        let err = load_grid_inputs(&settings(), &mut fetcher, "ISNE", date!(2024-01-01), date!(2024-01-02))
            .unwrap_err();
        assert!(matches!(err, EiaError::Transport(_)));
    }
}
