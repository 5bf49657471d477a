use crate::config::types::{EndpointRecord, IpfsEndpoint};

/// Human-readable line for one record at position `index`.
pub fn format_record(index: usize, record: &EndpointRecord) -> String {
    match record {
        EndpointRecord::Rpc(rpc) => format!("[{index}] {}", rpc.url()),
        EndpointRecord::Ipfs(IpfsEndpoint::Gateway(gateway)) => {
            format!("[{index}] ipfs gateway: {gateway}")
        }
        EndpointRecord::Ipfs(IpfsEndpoint::Api(api)) => {
            format!("[{index}] ipfs api: {}", api.url())
        }
    }
}

/// Lazy line-per-record view of a collection.
///
/// Cloning restarts from the current position; calling [`display`] again
/// restarts from the top.
#[derive(Debug, Clone)]
pub struct DisplayLines<'a> {
    records: std::iter::Enumerate<std::slice::Iter<'a, EndpointRecord>>,
}

impl Iterator for DisplayLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|(index, record)| format_record(index, record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for DisplayLines<'_> {}

pub fn display(records: &[EndpointRecord]) -> DisplayLines<'_> {
    DisplayLines {
        records: records.iter().enumerate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ApiProtocol, EndpointCollection, IpfsApi, RpcEndpoint, RpcProtocol};

    fn sample() -> EndpointCollection {
        vec![
            EndpointRecord::from(RpcEndpoint::new("localhost", 8545, RpcProtocol::Http)),
            EndpointRecord::from(IpfsEndpoint::Gateway("https://ipfs.io".into())),
            EndpointRecord::from(IpfsEndpoint::Api(IpfsApi {
                host: "ipfs.example.com".into(),
                port: 5001,
                protocol: ApiProtocol::Https,
            })),
        ]
        .into()
    }

    #[test]
    fn renders_each_record_kind() {
        let lines: Vec<String> = display(&sample()).collect();
        assert_eq!(
            lines,
            vec![
                "[0] http://localhost:8545",
                "[1] ipfs gateway: https://ipfs.io",
                "[2] ipfs api: https://ipfs.example.com:5001",
            ]
        );
    }

    #[test]
    fn sequence_can_be_restarted() {
        let collection = sample();
        let mut lines = display(&collection);
        lines.next();
        let rest = lines.clone().count();
        assert_eq!(rest, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(display(&collection).count(), 3);
    }

    #[test]
    fn empty_collection_renders_nothing() {
        assert_eq!(display(&[]).count(), 0);
    }
}
