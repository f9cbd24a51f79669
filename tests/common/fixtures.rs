//! Canned E-utilities and GEO responses and the mocks that serve them

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ELink response linking `identifier` to `dependents`
pub fn elink_xml(identifier: &str, dependents: &[&str]) -> String {
    let links: String = dependents
        .iter()
        .map(|id| format!("      <Link>\n        <Id>{id}</Id>\n      </Link>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eLinkResult PUBLIC "-//NLM//DTD elink 20101123//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20101123/elink.dtd">
<eLinkResult>
  <LinkSet>
    <DbFrom>pubmed</DbFrom>
    <IdList>
      <Id>{identifier}</Id>
    </IdList>
    <LinkSetDb>
      <DbTo>gds</DbTo>
      <LinkName>pubmed_gds</LinkName>
{links}    </LinkSetDb>
  </LinkSet>
</eLinkResult>"#
    )
}

/// ESummary response for one GEO DataSets UID
pub fn esummary_xml(dependent: &str, series: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSummaryResult>
<DocSum>
  <Id>{dependent}</Id>
  <Item Name="Accession" Type="String">GDS{dependent}</Item>
  <Item Name="title" Type="String">Dataset {dependent}</Item>
  <Item Name="summary" Type="String">Summary of dataset {dependent}.</Item>
  <Item Name="GPL" Type="String">570</Item>
  <Item Name="GSE" Type="String">{series}</Item>
  <Item Name="taxon" Type="String">Homo sapiens</Item>
  <Item Name="gdsType" Type="String">Expression profiling by array</Item>
</DocSum>
</eSummaryResult>"#
    )
}

/// GEO brief text for a series
pub fn series_text(series: &str) -> String {
    format!(
        "^SERIES = GSE{series}\n\
         !Series_title = Series {series}\n\
         !Series_overall_design = Design of series {series}.  Two groups.\n\
         !Series_type = Expression profiling by array\n"
    )
}

/// Serve an ELink response for `identifier`
pub async fn mount_links(server: &MockServer, identifier: &str, dependents: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .and(query_param("id", identifier))
        .respond_with(ResponseTemplate::new(200).set_body_string(elink_xml(identifier, dependents)))
        .mount(server)
        .await;
}

/// Serve the ESummary and series text for a dependent
pub async fn mount_dataset(server: &MockServer, dependent: &str, series: &str) {
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("id", dependent))
        .respond_with(ResponseTemplate::new(200).set_body_string(esummary_xml(dependent, series)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acc.cgi"))
        .and(query_param("acc", format!("GSE{series}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(series_text(series)))
        .mount(server)
        .await;
}
