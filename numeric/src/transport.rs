//! Peer-to-peer message transport between parties.
//!
//! Real deployments plug their own network channels into [`MultipartyTransport`]. This module
//! also provides in-process channels used to run all parties of a protocol inside one test.

use futures::{
    stream::{SplitSink, SplitStream},
    FutureExt, Sink, SinkExt, Stream, StreamExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio_serde::formats::Bincode;
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::TransportError;

/// Wrapper for peer-to-peer connections in multi-party protocol.
pub struct MultipartyTransport<T, Channel> {
    channels: Vec<Option<(SplitSink<Channel, T>, SplitStream<Channel>)>>,
    party_id: usize,
}

impl<T, Channel> MultipartyTransport<T, Channel>
where
    Channel: Stream + Sink<T>,
{
    /// Create wrapper for given list of connections. All channels but party_id should be present.
    pub fn new(
        channels: impl IntoIterator<Item = Option<Channel>>,
        party_id: usize,
    ) -> Result<Self, TransportError> {
        // We split streams into unidirectional halves. This allows us to
        // asynchronously wait on both receives and sends without bothering borrow checker.
        let channels: Vec<_> = channels.into_iter().map(|x| x.map(|x| x.split())).collect();
        for (j, channel) in channels.iter().enumerate() {
            if j != party_id && channel.is_none() {
                return Err(TransportError::MissingChannel(j));
            }
        }
        Ok(Self { channels, party_id })
    }
}

impl<T, Channel> MultipartyTransport<T, Channel> {
    /// Number of parties participating in multi-party protocol.
    pub fn num_parties(&self) -> usize {
        self.channels.len()
    }

    /// ID of current party.
    pub fn party_id(&self) -> usize {
        self.party_id
    }
}

impl<T, E, Channel> MultipartyTransport<T, Channel>
where
    T: Clone,
    Channel: Stream<Item = Result<T, E>> + Sink<T> + Unpin,
{
    /// Send message to party with given ID.
    pub async fn send_to(&mut self, other_id: usize, msg: T) -> Result<(), TransportError> {
        let (sink, _) = self.channel(other_id)?;
        sink.send(msg)
            .await
            .map_err(|_| TransportError::Send(other_id))
    }

    /// Receive message from party with given ID.
    pub async fn receive_from(&mut self, other_id: usize) -> Result<T, TransportError> {
        let (_, stream) = self.channel(other_id)?;
        match stream.next().await {
            Some(Ok(msg)) => Ok(msg),
            _ => Err(TransportError::Recv(other_id)),
        }
    }

    /// Send message to all parties.
    pub async fn send_to_all(&mut self, msg: T) -> Result<(), TransportError> {
        futures::future::try_join_all(self.peers().map(|(id, (sink, _))| {
            sink.send(msg.clone())
                .map(move |x| x.map_err(|_| TransportError::Send(id)))
        }))
        .await
        .map(|_| ())
    }

    /// Receive messages from all parties.
    pub async fn receive_from_all(&mut self) -> Result<Vec<(usize, T)>, TransportError> {
        futures::future::try_join_all(self.peers().map(|(id, (_, stream))| {
            stream.next().map(move |raw| match raw {
                Some(Ok(msg)) => Ok((id, msg)),
                _ => Err(TransportError::Recv(id)),
            })
        }))
        .await
    }

    fn channel(
        &mut self,
        other_id: usize,
    ) -> Result<&mut (SplitSink<Channel, T>, SplitStream<Channel>), TransportError> {
        if other_id == self.party_id {
            return Err(TransportError::MissingChannel(other_id));
        }
        self.channels
            .get_mut(other_id)
            .and_then(Option::as_mut)
            .ok_or(TransportError::MissingChannel(other_id))
    }

    /// Channels to all other parties.
    fn peers(
        &mut self,
    ) -> impl Iterator<Item = (usize, &mut (SplitSink<Channel, T>, SplitStream<Channel>))> {
        self.channels
            .iter_mut()
            .enumerate()
            .filter_map(|(id, channel)| channel.as_mut().map(|channel| (id, channel)))
    }
}

/// Length-framed Bincode-encoded messages channel.
pub type BincodeStreamSink<T, C> =
    tokio_serde::Framed<tokio_util::codec::Framed<C, LengthDelimitedCodec>, T, T, Bincode<T, T>>;

/// Length-framed Bincode-encoded tokio's Duplex stream.
pub type BincodeDuplex<T> = BincodeStreamSink<T, DuplexStream>;

/// Create length-framed Bincode-encoded message channel from AsyncRead/Write.
pub fn wrap_channel_with_bincode<T, C>(channel: C) -> BincodeStreamSink<T, C>
where
    C: AsyncRead + AsyncWrite,
{
    let length_delimited = tokio_util::codec::Framed::new(channel, LengthDelimitedCodec::new());
    tokio_serde::Framed::new(length_delimited, Bincode::default())
}

/// Create bidirectional Bincode-encoded channel.
pub fn bincode_duplex<T>(max_buf_size: usize) -> (BincodeDuplex<T>, BincodeDuplex<T>) {
    let (a, b) = tokio::io::duplex(max_buf_size);
    (
        wrap_channel_with_bincode(a),
        wrap_channel_with_bincode(b),
    )
}

/// Create in-process channels for testing multiparty protocols.
pub fn mock_multiparty_channels<T>(
    num_parties: usize,
    max_buf_size: usize,
) -> Vec<MultipartyTransport<T, BincodeDuplex<T>>>
where
    T: Clone + Serialize + DeserializeOwned + Unpin,
{
    let mut matrix: Vec<Vec<_>> = (0..num_parties)
        .map(|_| (0..num_parties).map(|_| None).collect())
        .collect();

    for i in 0..num_parties {
        for j in 0..i {
            let (a, b) = bincode_duplex::<T>(max_buf_size);
            matrix[i][j] = Some(a);
            matrix[j][i] = Some(b);
        }
    }

    matrix
        .into_iter()
        .enumerate()
        .map(|(id, row)| MultipartyTransport {
            channels: row.into_iter().map(|x| x.map(StreamExt::split)).collect(),
            party_id: id,
        })
        .collect()
}
