use url::Url;

use crate::{dal::BusinessStore, domain::business::BusinessRecord};

const MAX_MATCHES: i64 = 2;

/// Host of a website, with the port when it is not the scheme default.
///
/// `https://example.com/page` becomes `example.com`. Hosts are lowercased by
/// the URL parser; `www.` prefixes are kept, the store lookup is a substring
/// match. Values that do not parse as a URL with a host are cut at the first
/// `/` after any scheme.
pub fn normalized_domain(website: &str) -> String {
    if let Ok(parsed_url) = Url::parse(website) {
        if let Some(host) = parsed_url.host_str() {
            return match parsed_url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
        }
    }

    let without_scheme = match website.split_once("://") {
        Some((_, rest)) => rest,
        None => website,
    };

    match without_scheme.split_once('/') {
        Some((domain, _)) => domain.to_string(),
        None => without_scheme.to_string(),
    }
}

/// Whether `record` is absent from the store.
///
/// Businesses without a website are never novel: they are excluded from
/// acquisition altogether.
pub async fn is_novel(store: &dyn BusinessStore, record: &BusinessRecord) -> anyhow::Result<bool> {
    let Some(website) = record.website.as_deref() else {
        return Ok(false);
    };

    let domain = normalized_domain(website);
    if domain.is_empty() {
        log::warn!("Ignoring {} with unusable website {:?}", record.name, website);
        return Ok(false);
    }

    let matches = store.find_website_matches(&domain, MAX_MATCHES).await?;
    Ok(matches.is_empty())
}

/// Keeps the novel records, in order.
///
/// Records accepted earlier in the same batch count as stored, since nothing
/// from this batch is persisted yet. Against them the substring rule is
/// applied both ways, so `example.com` and `www.example.com` collide whichever
/// comes first.
pub async fn filter_novel(
    store: &dyn BusinessStore,
    records: Vec<BusinessRecord>,
) -> anyhow::Result<Vec<BusinessRecord>> {
    // (website, normalized domain) of every accepted record
    let mut accepted: Vec<(String, String)> = vec![];
    let mut novel = Vec::with_capacity(records.len());

    for record in records {
        if !is_novel(store, &record).await? {
            continue;
        }

        // is_novel only passes records with a website and a non-empty domain
        let website = record.website.clone().unwrap_or_default();
        let domain = normalized_domain(&website);

        let collides = accepted.iter().any(|(seen_website, seen_domain)| {
            seen_website.contains(&domain) || website.contains(seen_domain.as_str())
        });

        match collides {
            true => log::info!("Skipping {}: {} already in this batch", record.name, domain),
            false => {
                accepted.push((website, domain));
                novel.push(record);
            }
        }
    }

    Ok(novel)
}
