//! Weighted compressed-sparse-row encoding for graph adjacency.
//!
//! Layout (little endian): magic `CSRW`, row count `n: u64`, entry count `nnz: u64`,
//! `n + 1` row offsets (`u64`), `nnz` neighbor indices (`u32`), `nnz` weights (`f64`).

use anyhow::{Context, Result, ensure};

const MAGIC: &[u8; 4] = b"CSRW";
const HEADER_LEN: usize = 4 + 8 + 8;

/// Encode per-row neighbor lists and their edge weights.
pub(crate) fn write_weighted_csr_bytes(adjacencies: &[Vec<u32>], weights: &[Vec<f64>]) -> Result<Vec<u8>> {
    ensure!(
        adjacencies.len() == weights.len(),
        "[io::csr] {} adjacency rows but {} weight rows", adjacencies.len(), weights.len()
    );
    for (row, (nbrs, wts)) in adjacencies.iter().zip(weights).enumerate() {
        ensure!(
            nbrs.len() == wts.len(),
            "[io::csr] Row {row} has {} neighbors but {} weights", nbrs.len(), wts.len()
        );
    }

    let n = adjacencies.len();
    let nnz = adjacencies.iter().map(Vec::len).sum::<usize>();
    let mut out = Vec::with_capacity(encoded_len(n, nnz).unwrap_or_default());

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(n as u64).to_le_bytes());
    out.extend_from_slice(&(nnz as u64).to_le_bytes());

    let mut offset = 0u64;
    out.extend_from_slice(&offset.to_le_bytes());
    for nbrs in adjacencies {
        offset += nbrs.len() as u64;
        out.extend_from_slice(&offset.to_le_bytes());
    }
    for &j in adjacencies.iter().flatten() {
        out.extend_from_slice(&j.to_le_bytes());
    }
    for &w in weights.iter().flatten() {
        out.extend_from_slice(&w.to_le_bytes());
    }

    Ok(out)
}

/// Total encoded size for `n` rows and `nnz` entries, or `None` on overflow.
fn encoded_len(n: usize, nnz: usize) -> Option<usize> {
    let offsets = n.checked_add(1)?.checked_mul(8)?;
    let entries = nnz.checked_mul(4 + 8)?;
    HEADER_LEN.checked_add(offsets)?.checked_add(entries)
}

fn u64_at(bytes: &[u8], at: usize) -> u64 {
    let mut b8 = [0u8; 8];
    b8.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(b8)
}

/// Decode bytes produced by [`write_weighted_csr_bytes`].
///
/// The input must be exactly one well-formed record: offsets start at zero and never
/// decrease, and every neighbor index names an existing row.
pub(crate) fn read_weighted_csr_bytes(bytes: &[u8]) -> Result<(Vec<Vec<u32>>, Vec<Vec<f64>>)> {
    ensure!(bytes.len() >= HEADER_LEN, "[io::csr] Input too short for header ({} bytes)", bytes.len());
    ensure!(&bytes[..4] == MAGIC, "[io::csr] Invalid CSR magic: expected 'CSRW'");

    let n = usize::try_from(u64_at(bytes, 4)).context("[io::csr] Row count overflows usize")?;
    let nnz = usize::try_from(u64_at(bytes, 12)).context("[io::csr] Entry count overflows usize")?;
    let expected = encoded_len(n, nnz)
        .with_context(|| format!("[io::csr] Header claims {n} rows / {nnz} entries"))?;
    ensure!(
        expected == bytes.len(),
        "[io::csr] Header claims {n} rows / {nnz} entries ({expected} bytes), input has {}", bytes.len()
    );

    let (offsets, rest) = bytes[HEADER_LEN..].split_at((n + 1) * 8);
    let (indices, data) = rest.split_at(nnz * 4);

    let offsets = offsets.chunks_exact(8)
        .map(|c| u64_at(c, 0) as usize)
        .collect::<Vec<_>>();
    ensure!(offsets[0] == 0, "[io::csr] Row offsets must start at 0");
    ensure!(offsets.windows(2).all(|w| w[0] <= w[1]), "[io::csr] Row offsets decrease");
    ensure!(offsets[n] == nnz, "[io::csr] Last row offset {} does not match {nnz} entries", offsets[n]);

    let indices = indices.chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect::<Vec<_>>();
    if let Some(&j) = indices.iter().find(|&&j| j as usize >= n) {
        anyhow::bail!("[io::csr] Neighbor index {j} out of range for {n} rows");
    }

    let data = data.chunks_exact(8)
        .map(|c| f64::from_bits(u64_at(c, 0)))
        .collect::<Vec<_>>();

    Ok(offsets.windows(2)
        .map(|w| (indices[w[0]..w[1]].to_vec(), data[w[0]..w[1]].to_vec()))
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_rows_survive_encoding() {
        let adj = vec![vec![1, 2], vec![0], vec![0], vec![]];
        let wts = vec![vec![1.0, 2.5], vec![1.0], vec![2.5], vec![]];

        let bytes = write_weighted_csr_bytes(&adj, &wts).unwrap();
        assert_eq!(bytes.len(), encoded_len(4, 4).unwrap());

        let (adj2, wts2) = read_weighted_csr_bytes(&bytes).unwrap();
        assert_eq!(adj2, adj);
        assert_eq!(wts2, wts);
    }

    #[test]
    fn empty_graph_survives_encoding() {
        let bytes = write_weighted_csr_bytes(&[], &[]).unwrap();
        let (adj, wts) = read_weighted_csr_bytes(&bytes).unwrap();
        assert!(adj.is_empty() && wts.is_empty());
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        assert!(write_weighted_csr_bytes(&[vec![1]], &[vec![]]).is_err());
        assert!(write_weighted_csr_bytes(&[vec![1]], &[]).is_err());
    }

    #[test]
    fn corrupt_bytes_are_rejected() {
        let bytes = write_weighted_csr_bytes(&[vec![1], vec![0]], &[vec![1.0], vec![1.0]]).unwrap();
        assert!(read_weighted_csr_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(read_weighted_csr_bytes(&trailing).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(read_weighted_csr_bytes(&bad_magic).is_err());

        let mut huge = bytes.clone();
        huge[4..12].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(read_weighted_csr_bytes(&huge).is_err());

        // Neighbor of row 0 points past the last row.
        let mut out_of_range = bytes.clone();
        let first_index = HEADER_LEN + 3 * 8;
        out_of_range[first_index..first_index + 4].copy_from_slice(&7u32.to_le_bytes());
        assert!(read_weighted_csr_bytes(&out_of_range).is_err());
    }
}
