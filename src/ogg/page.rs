use std::io::{self, Read, Write};

use crate::error::{OggOpusError, Result};
use crate::ogg::crc::crc32;
use crate::ogg::{
    GRANULE_NONE, MAX_SEGMENTS, MAX_SEGMENT_SIZE, OGG_HEADER_SIZE, OGG_HEADER_TYPE_BOS,
    OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE, OGG_VERSION,
};
use crate::utils::io::{read_le_u32, read_le_u64};

/// OGG Page Header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPageHeader {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: u64,
    pub bitstream_serial: u32,
    pub page_sequence: u32,
    pub crc: u32,
    pub segment_table: Vec<u8>,
}

/// OGG Page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPage {
    pub header: OggPageHeader,
    pub data: Vec<u8>,
}

/// Lacing values for one whole packet of `len` bytes.
///
/// A packet whose length is a multiple of 255 ends with a zero lacing value,
/// so an empty packet is a single `0`.
pub fn lacing_values(len: usize) -> Vec<u8> {
    let mut table = vec![MAX_SEGMENT_SIZE as u8; len / MAX_SEGMENT_SIZE];
    table.push((len % MAX_SEGMENT_SIZE) as u8);
    table
}

impl OggPageHeader {
    /// Read OGG page header from a reader, `None` at a clean end of input
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut header = [0u8; OGG_HEADER_SIZE];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        // Check OGG signature
        if &header[0..4] != OGG_SIGNATURE {
            return Err(OggOpusError::Format("missing OggS capture pattern".to_string()));
        }

        let version = header[4];
        if version != OGG_VERSION {
            return Err(OggOpusError::Format(format!("unsupported Ogg version {version}")));
        }

        let header_type = header[5];
        let mut fields = &header[6..26];
        let granule_position = read_le_u64(&mut fields)?;
        let bitstream_serial = read_le_u32(&mut fields)?;
        let page_sequence = read_le_u32(&mut fields)?;
        let crc = read_le_u32(&mut fields)?;
        let segment_count = header[26];

        // Read segment table
        let mut segment_table = vec![0u8; segment_count as usize];
        reader
            .read_exact(&mut segment_table)
            .map_err(|_| OggOpusError::Format("truncated segment table".to_string()))?;

        Ok(Some(OggPageHeader {
            version,
            header_type,
            granule_position,
            bitstream_serial,
            page_sequence,
            crc,
            segment_table,
        }))
    }

    /// Calculate total page data size from segment table
    pub fn data_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    pub fn is_continuation(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// Whether at least one packet finishes on this page
    pub fn completes_packet(&self) -> bool {
        self.segment_table.iter().any(|&lace| (lace as usize) < MAX_SEGMENT_SIZE)
    }

    fn write_fields(&self, out: &mut Vec<u8>, crc: u32) {
        out.extend_from_slice(OGG_SIGNATURE);
        out.push(self.version);
        out.push(self.header_type);
        out.extend_from_slice(&self.granule_position.to_le_bytes());
        out.extend_from_slice(&self.bitstream_serial.to_le_bytes());
        out.extend_from_slice(&self.page_sequence.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.push(self.segment_table.len() as u8);
        out.extend_from_slice(&self.segment_table);
    }
}

impl OggPage {
    /// Build a page and compute its checksum
    pub fn new(
        header_type: u8,
        granule_position: u64,
        bitstream_serial: u32,
        page_sequence: u32,
        segment_table: Vec<u8>,
        data: Vec<u8>,
    ) -> Self {
        debug_assert!(segment_table.len() <= MAX_SEGMENTS);
        debug_assert_eq!(
            segment_table.iter().map(|&x| x as usize).sum::<usize>(),
            data.len()
        );

        let mut page = OggPage {
            header: OggPageHeader {
                version: OGG_VERSION,
                header_type,
                granule_position,
                bitstream_serial,
                page_sequence,
                crc: 0,
                segment_table,
            },
            data,
        };
        page.header.crc = page.compute_crc();
        page
    }

    /// Read OGG page from a reader, `None` at a clean end of input
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let header = match OggPageHeader::read(reader)? {
            Some(header) => header,
            None => return Ok(None),
        };

        // Read page data
        let mut data = vec![0u8; header.data_size()];
        reader
            .read_exact(&mut data)
            .map_err(|_| OggOpusError::Format("truncated page body".to_string()))?;

        Ok(Some(OggPage { header, data }))
    }

    /// Read every page until the end of input
    pub fn read_all<R: Read>(reader: &mut R) -> Result<Vec<Self>> {
        let mut pages = Vec::new();
        while let Some(page) = Self::read(reader)? {
            pages.push(page);
        }
        Ok(pages)
    }

    /// Serialised size in bytes
    pub fn len(&self) -> usize {
        OGG_HEADER_SIZE + self.header.segment_table.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.header.write_fields(&mut out, self.header.crc);
        out.extend_from_slice(&self.data);
        out
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    fn compute_crc(&self) -> u32 {
        let mut bytes = Vec::with_capacity(self.len());
        self.header.write_fields(&mut bytes, 0);
        bytes.extend_from_slice(&self.data);
        crc32(&bytes)
    }

    pub fn verify_checksum(&self) -> bool {
        self.compute_crc() == self.header.crc
    }

    /// Granule position, `None` when no packet finishes on this page
    pub fn granule(&self) -> Option<u64> {
        match self.header.granule_position {
            GRANULE_NONE => None,
            granule => Some(granule),
        }
    }

    /// Packet pieces on this page in lacing order.
    ///
    /// The first piece continues a packet from the previous page when the
    /// continuation flag is set; the last piece is unfinished when the final
    /// lacing value is 255.
    pub fn packets(&self) -> Vec<&[u8]> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut end = 0;
        for &lace in &self.header.segment_table {
            end += lace as usize;
            if (lace as usize) < MAX_SEGMENT_SIZE {
                pieces.push(&self.data[start..end]);
                start = end;
            }
        }
        if start < end {
            pieces.push(&self.data[start..end]);
        }
        pieces
    }
}
