//! `rfp` subcommands: requirement extraction, evaluator simulation, proposal drafting.

use std::sync::Arc;

use anyhow::Context;
use dealvelocity_ai::{
    ChatModel, ContextSource, EvaluatorAgent, NoContext, OpenAiClient, ProposalGenerator,
    RfpParser,
};
use dealvelocity_services::VectorStoreClient;

use crate::{ModelArgs, RfpCommands, display, load_text};

pub async fn run(command: RfpCommands, args: &ModelArgs, processor_url: &str) -> anyhow::Result<()> {
    let config = args.config()?;
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiClient::new(&config)?);

    match command {
        RfpCommands::Parse {
            file,
            via_processor,
            json,
        } => {
            let text = load_text(&file, via_processor, processor_url).await?;
            let requirements = RfpParser::new(model, config).parse(&text).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&requirements)?);
            } else {
                display::print_requirements(&requirements);
            }
        }
        RfpCommands::Simulate {
            requirement,
            proposal,
            persona,
        } => {
            let proposal_text = tokio::fs::read_to_string(&proposal)
                .await
                .with_context(|| format!("reading {}", proposal.display()))?;
            let simulation = EvaluatorAgent::new(model, config)
                .simulate(&requirement, &proposal_text, persona)
                .await
                .context("evaluator simulation failed")?;
            display::print_simulation(&simulation);
        }
        RfpCommands::Draft {
            requirement,
            vector_store_url,
            vector_store_api_key,
            no_context,
        } => {
            let context: Arc<dyn ContextSource> = if no_context {
                Arc::new(NoContext)
            } else {
                Arc::new(VectorStoreClient::new(vector_store_url, vector_store_api_key))
            };
            let section = ProposalGenerator::new(model, config, context)
                .draft(&requirement)
                .await
                .context("proposal drafting failed")?;
            display::print_section(&section);
        }
    }

    Ok(())
}
