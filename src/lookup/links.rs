//! ELink response parsing.

use crate::error::Result;
use crate::types::DependentId;
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;

/// Extract every `Link/Id` text from an ELink XML response, in document order
///
/// `Id` elements elsewhere (the echoed `IdList` of the query) are ignored, as
/// are empty ones.
pub(crate) fn parse_link_ids(xml: &str) -> Result<Vec<DependentId>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut ids = Vec::new();
    let mut capturing = false;
    let mut current = String::new();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => {
                let name = e.name().as_ref().to_vec();
                capturing = name == b"Id" && stack.last().is_some_and(|parent| parent == b"Link");
                current.clear();
                stack.push(name);
            }
            XmlEvent::Text(t) if capturing => current.push_str(&t.unescape()?),
            XmlEvent::CData(c) if capturing => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            XmlEvent::End(_) => {
                let closed = stack.pop();
                if capturing && closed.as_deref() == Some(b"Id".as_slice()) {
                    let id = current.trim();
                    if !id.is_empty() {
                        ids.push(DependentId::new(id));
                    }
                }
                capturing = false;
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const ELINK_TWO_LINKS: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eLinkResult PUBLIC "-//NLM//DTD elink 20101123//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20101123/elink.dtd">
<eLinkResult>
  <LinkSet>
    <DbFrom>pubmed</DbFrom>
    <IdList>
      <Id>31000000</Id>
    </IdList>
    <LinkSetDb>
      <DbTo>gds</DbTo>
      <LinkName>pubmed_gds</LinkName>
      <Link>
        <Id>200123456</Id>
      </Link>
      <Link>
        <Id>200654321</Id>
      </Link>
    </LinkSetDb>
  </LinkSet>
</eLinkResult>"#;

    #[test]
    fn test_extracts_link_ids_in_order() {
        let ids = parse_link_ids(ELINK_TWO_LINKS).unwrap();
        assert_eq!(
            ids,
            vec![DependentId::new("200123456"), DependentId::new("200654321")]
        );
    }

    #[test]
    fn test_query_echo_is_not_a_link() {
        let xml = r#"<eLinkResult><LinkSet><DbFrom>pubmed</DbFrom>
            <IdList><Id>31000000</Id></IdList></LinkSet></eLinkResult>"#;
        assert!(parse_link_ids(xml).unwrap().is_empty());
    }

    #[test]
    fn test_links_across_link_sets_are_concatenated() {
        let xml = r#"<eLinkResult>
            <LinkSet><LinkSetDb><Link><Id>1</Id></Link></LinkSetDb></LinkSet>
            <LinkSet><LinkSetDb><Link><Id>2</Id></Link><Link><Id>3</Id></Link></LinkSetDb></LinkSet>
        </eLinkResult>"#;
        let ids: Vec<String> = parse_link_ids(xml)
            .unwrap()
            .into_iter()
            .map(|id| id.0)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_duplicate_links_are_preserved() {
        let xml = "<r><Link><Id>7</Id></Link><Link><Id>7</Id></Link></r>";
        assert_eq!(parse_link_ids(xml).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_ids_are_skipped() {
        let xml = "<r><Link><Id/></Link><Link><Id>  </Id></Link><Link><Id>9</Id></Link></r>";
        assert_eq!(parse_link_ids(xml).unwrap(), vec![DependentId::new("9")]);
    }

    #[test]
    fn test_mismatched_tags_are_an_error() {
        assert!(parse_link_ids("<eLinkResult><Link><Id>1</Link></eLinkResult>").is_err());
    }

    #[test]
    fn test_error_document_has_no_links() {
        let xml = "<eLinkResult><ERROR>Invalid uid</ERROR></eLinkResult>";
        assert!(parse_link_ids(xml).unwrap().is_empty());
    }
}
